//! Rules over the subject or issuer distinguished name.

use super::{RuleResult, ValidatorRule};
use crate::{dn, Certificate, DistinguishedName, ValidationError};
use std::collections::HashSet;
use std::sync::Arc;

/// Which of the certificate's names a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Principal {
    #[default]
    Subject,
    Issuer,
}

impl Principal {
    pub fn of<'a>(&self, certificate: &'a Certificate) -> &'a DistinguishedName {
        match self {
            Principal::Subject => certificate.subject(),
            Principal::Issuer => certificate.issuer(),
        }
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Principal::Subject => write!(f, "subject"),
            Principal::Issuer => write!(f, "issuer"),
        }
    }
}

/// Errors a [`PrincipalNameProvider`] may raise instead of answering.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("malformed value: {0}")]
    Encoding(String),

    #[error("lookup failed: {0}")]
    Lookup(String),
}

/// Decides whether a value taken from a distinguished name is acceptable.
pub trait PrincipalNameProvider: Send + Sync {
    fn validate(&self, value: &str) -> Result<bool, ProviderError>;
}

impl<P: PrincipalNameProvider + ?Sized> PrincipalNameProvider for Arc<P> {
    fn validate(&self, value: &str) -> Result<bool, ProviderError> {
        (**self).validate(value)
    }
}

impl<P: PrincipalNameProvider + ?Sized> PrincipalNameProvider for Box<P> {
    fn validate(&self, value: &str) -> Result<bool, ProviderError> {
        (**self).validate(value)
    }
}

/// Accepts values from a fixed set (exact, case-sensitive match).
#[derive(Debug, Clone, Default)]
pub struct SimplePrincipalNameProvider {
    accepted: HashSet<String>,
}

impl SimplePrincipalNameProvider {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SimplePrincipalNameProvider {
            accepted: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl PrincipalNameProvider for SimplePrincipalNameProvider {
    fn validate(&self, value: &str) -> Result<bool, ProviderError> {
        Ok(self.accepted.contains(value))
    }
}

/// A provider backed by a plain predicate. See [`from_predicate`].
pub struct PredicateProvider<F>(F);

/// Wrap a predicate as a provider that never fails.
pub fn from_predicate<F>(predicate: F) -> PredicateProvider<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    PredicateProvider(predicate)
}

impl<F> PrincipalNameProvider for PredicateProvider<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn validate(&self, value: &str) -> Result<bool, ProviderError> {
        Ok((self.0)(value))
    }
}

/// Checks one attribute (or the whole name) of the subject or issuer.
///
/// With an attribute key, every occurrence of that attribute is offered to
/// the provider in name order, and the rule accepts as soon as one value is
/// accepted. Without a key the complete RFC 4514 rendering of the name is
/// offered once.
pub struct PrincipalNameRule<P> {
    provider: P,
    principal: Principal,
    field: Option<String>,
}

impl<P: PrincipalNameProvider> PrincipalNameRule<P> {
    /// Check attribute `field` of the subject.
    pub fn attribute(field: impl Into<String>, provider: P) -> Self {
        Self::with_principal(field, provider, Principal::Subject)
    }

    /// Check attribute `field` of the chosen principal.
    pub fn with_principal(field: impl Into<String>, provider: P, principal: Principal) -> Self {
        PrincipalNameRule {
            provider,
            principal,
            field: Some(field.into()),
        }
    }

    /// Check the complete name of the chosen principal.
    pub fn full_name(provider: P, principal: Principal) -> Self {
        PrincipalNameRule {
            provider,
            principal,
            field: None,
        }
    }
}

impl<P: PrincipalNameProvider> ValidatorRule for PrincipalNameRule<P> {
    fn validate(&self, certificate: &Certificate) -> RuleResult {
        let name = self.principal.of(certificate).to_rfc4514();
        let values = match &self.field {
            Some(field) => dn::extract(&name, field).map_err(|e| {
                tracing::debug!(serial = certificate.serial(), error = %e, "unreadable {}", self.principal);
                ValidationError::infrastructure_caused_by(
                    certificate,
                    format!("unable to read {} name", self.principal),
                    e,
                )
            })?,
            None => vec![name],
        };

        for value in &values {
            match self.provider.validate(value) {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(serial = certificate.serial(), error = %e, "principal name provider failed");
                    return Err(ValidationError::infrastructure_caused_by(
                        certificate,
                        format!("unable to check {} name", self.principal),
                        e,
                    ));
                }
            }
        }

        let reason = match &self.field {
            Some(field) => format!("{} attribute {} not accepted", self.principal, field),
            None => format!("{} name not accepted", self.principal),
        };
        tracing::debug!(serial = certificate.serial(), "{}", reason);
        Err(ValidationError::failed(certificate, reason))
    }
}
