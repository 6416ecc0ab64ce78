//! The rule contract and the rules built on it.
//!
//! Every rule implements [`ValidatorRule`]: a pure decision over a
//! certificate and the rule's own fixed configuration. Rules never mutate
//! the certificate and hold no per-call state, so one rule instance can
//! serve any number of concurrent validations.

pub mod chain;
pub mod critical_extension;
pub mod expiration;
pub mod junction;
pub mod ocsp;
pub mod org_number;
pub mod principal_name;
pub mod signing;

use crate::{Certificate, ValidationError};
use std::sync::Arc;

/// Outcome of evaluating one rule against one certificate.
pub type RuleResult = Result<(), ValidationError>;

/// A single trust condition.
///
/// Collaborator errors (I/O, malformed data) must be translated into
/// [`ValidationError`] before they leave `validate`.
pub trait ValidatorRule: Send + Sync {
    fn validate(&self, certificate: &Certificate) -> RuleResult;
}

/// Wrap a closure as a rule.
///
/// ```
/// use certrule_lib::{rule, ValidationError};
///
/// let has_aia = rule::from_fn(|cert| {
///     if cert.has_authority_info_access() {
///         Ok(())
///     } else {
///         Err(ValidationError::failed(cert, "no AIA extension"))
///     }
/// });
/// # let _ = has_aia;
/// ```
pub fn from_fn<F>(f: F) -> FnRule<F>
where
    F: Fn(&Certificate) -> RuleResult + Send + Sync,
{
    FnRule(f)
}

/// A rule backed by a closure. See [`from_fn`].
pub struct FnRule<F>(F);

impl<F> ValidatorRule for FnRule<F>
where
    F: Fn(&Certificate) -> RuleResult + Send + Sync,
{
    fn validate(&self, certificate: &Certificate) -> RuleResult {
        (self.0)(certificate)
    }
}

impl ValidatorRule for Box<dyn ValidatorRule> {
    fn validate(&self, certificate: &Certificate) -> RuleResult {
        (**self).validate(certificate)
    }
}

impl<R: ValidatorRule + ?Sized> ValidatorRule for Arc<R> {
    fn validate(&self, certificate: &Certificate) -> RuleResult {
        (**self).validate(certificate)
    }
}
