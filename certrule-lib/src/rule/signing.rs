//! Self-signed versus CA-signed policy.

use super::{RuleResult, ValidatorRule};
use crate::{Certificate, ValidationError};

/// Restricts certificates by how they were signed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningRule {
    /// Only self-signed certificates: subject equals issuer and the
    /// signature verifies with the certificate's own key.
    SelfSignedOnly,
    /// Only certificates issued by someone else.
    PublicSignedOnly,
}

impl ValidatorRule for SigningRule {
    fn validate(&self, certificate: &Certificate) -> RuleResult {
        let self_signed = certificate.is_self_signed();
        match (self, self_signed) {
            (SigningRule::SelfSignedOnly, false) => {
                tracing::debug!(serial = certificate.serial(), "certificate is not self-signed");
                Err(ValidationError::failed(certificate, "certificate is not self-signed"))
            }
            (SigningRule::PublicSignedOnly, true) => {
                tracing::debug!(serial = certificate.serial(), "certificate is self-signed");
                Err(ValidationError::failed(certificate, "certificate is self-signed"))
            }
            _ => Ok(()),
        }
    }
}
