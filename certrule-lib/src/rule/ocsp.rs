//! Revocation checking through OCSP.
//!
//! The rule resolves the issuing certificate from a bucket of intermediates
//! and hands both certificates to a [`RevocationResponder`], which owns the
//! network transport (HTTP client, timeouts, retries, nonce handling).

use super::{RuleResult, ValidatorRule};
use crate::{Certificate, CertificateBucket, ValidationError};
use std::sync::Arc;

/// CRL/OCSP revocation reason codes (RFC 5280 Section 5.3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationReason {
    Unspecified,
    KeyCompromise,
    CaCompromise,
    AffiliationChanged,
    Superseded,
    CessationOfOperation,
    CertificateHold,
    RemoveFromCrl,
    PrivilegeWithdrawn,
    AaCompromise,
}

impl RevocationReason {
    /// Map a numeric reason code. Unassigned codes (including 7) are
    /// treated as unspecified.
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => RevocationReason::KeyCompromise,
            2 => RevocationReason::CaCompromise,
            3 => RevocationReason::AffiliationChanged,
            4 => RevocationReason::Superseded,
            5 => RevocationReason::CessationOfOperation,
            6 => RevocationReason::CertificateHold,
            8 => RevocationReason::RemoveFromCrl,
            9 => RevocationReason::PrivilegeWithdrawn,
            10 => RevocationReason::AaCompromise,
            _ => RevocationReason::Unspecified,
        }
    }
}

impl std::fmt::Display for RevocationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RevocationReason::Unspecified => "unspecified",
            RevocationReason::KeyCompromise => "keyCompromise",
            RevocationReason::CaCompromise => "cACompromise",
            RevocationReason::AffiliationChanged => "affiliationChanged",
            RevocationReason::Superseded => "superseded",
            RevocationReason::CessationOfOperation => "cessationOfOperation",
            RevocationReason::CertificateHold => "certificateHold",
            RevocationReason::RemoveFromCrl => "removeFromCRL",
            RevocationReason::PrivilegeWithdrawn => "privilegeWithdrawn",
            RevocationReason::AaCompromise => "aACompromise",
        };
        f.write_str(name)
    }
}

/// The certificate status reported by a responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertStatus {
    Good,
    Revoked,
    Unknown,
}

impl std::fmt::Display for CertStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CertStatus::Good => write!(f, "good"),
            CertStatus::Revoked => write!(f, "revoked"),
            CertStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// A successful responder answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevocationStatus {
    pub status: CertStatus,
    /// Unix timestamp of revocation, for revoked certificates.
    pub revocation_time: Option<i64>,
    pub reason: Option<RevocationReason>,
}

impl RevocationStatus {
    pub fn good() -> Self {
        RevocationStatus {
            status: CertStatus::Good,
            revocation_time: None,
            reason: None,
        }
    }

    pub fn revoked(revocation_time: Option<i64>, reason: Option<RevocationReason>) -> Self {
        RevocationStatus {
            status: CertStatus::Revoked,
            revocation_time,
            reason,
        }
    }

    pub fn unknown() -> Self {
        RevocationStatus {
            status: CertStatus::Unknown,
            revocation_time: None,
            reason: None,
        }
    }
}

impl std::fmt::Display for RevocationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.status)?;
        if let Some(reason) = self.reason {
            write!(f, " ({})", reason)?;
        }
        if let Some(time) = self.revocation_time {
            write!(f, " at {}", time)?;
        }
        Ok(())
    }
}

/// What the rule asks a responder.
#[derive(Debug, Clone)]
pub struct OcspRequest<'a> {
    pub certificate: &'a Certificate,
    pub issuer: &'a Certificate,
    /// OCSP URLs from the certificate's AIA extension, in order.
    pub responder_urls: Vec<String>,
}

/// Why a responder could not produce an answer. A negative answer
/// (revoked/unknown) is not an error.
#[derive(Debug, thiserror::Error)]
pub enum ResponderError {
    #[error("no OCSP responder available")]
    NoResponder,

    #[error("OCSP transport error: {0}")]
    Transport(String),

    #[error("OCSP protocol error: {0}")]
    Protocol(String),
}

/// Answers revocation queries. Implementations must be safe for concurrent
/// use; one call is made per validation.
pub trait RevocationResponder: Send + Sync {
    fn check(&self, request: &OcspRequest<'_>) -> Result<RevocationStatus, ResponderError>;
}

impl<R: RevocationResponder + ?Sized> RevocationResponder for Arc<R> {
    fn check(&self, request: &OcspRequest<'_>) -> Result<RevocationStatus, ResponderError> {
        (**self).check(request)
    }
}

impl<R: RevocationResponder + ?Sized> RevocationResponder for Box<R> {
    fn check(&self, request: &OcspRequest<'_>) -> Result<RevocationStatus, ResponderError> {
        (**self).check(request)
    }
}

/// Requires a "good" OCSP status for certificates that advertise Authority
/// Information Access.
///
/// Certificates without the AIA extension are not subject to OCSP and pass
/// without any lookup.
pub struct OcspRule {
    intermediates: Arc<dyn CertificateBucket>,
    responder: Arc<dyn RevocationResponder>,
}

impl OcspRule {
    pub fn new(
        intermediates: Arc<dyn CertificateBucket>,
        responder: Arc<dyn RevocationResponder>,
    ) -> Self {
        OcspRule {
            intermediates,
            responder,
        }
    }
}

impl ValidatorRule for OcspRule {
    fn validate(&self, certificate: &Certificate) -> RuleResult {
        if !certificate.has_authority_info_access() {
            tracing::trace!(serial = certificate.serial(), "no AIA extension, OCSP not applicable");
            return Ok(());
        }

        let Some(issuer) = self.intermediates.find_by_subject(certificate.issuer()) else {
            let reason = format!(
                "unable to find issuer certificate '{}'",
                certificate.issuer()
            );
            tracing::debug!(serial = certificate.serial(), "{}", reason);
            return Err(ValidationError::infrastructure(certificate, reason));
        };

        let request = OcspRequest {
            certificate,
            issuer,
            responder_urls: certificate.ocsp_urls(),
        };
        let answer = self.responder.check(&request).map_err(|e| {
            tracing::debug!(serial = certificate.serial(), error = %e, "OCSP request failed");
            ValidationError::infrastructure_caused_by(certificate, "OCSP request failed", e)
        })?;

        if answer.status != CertStatus::Good {
            tracing::debug!(
                serial = certificate.serial(),
                status = %answer,
                "certificate status is not reported as good by OCSP"
            );
            return Err(ValidationError::failed(
                certificate,
                format!(
                    "certificate status is not reported as good by OCSP: {}",
                    answer
                ),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_follow_rfc5280() {
        assert_eq!(RevocationReason::from_code(1), RevocationReason::KeyCompromise);
        assert_eq!(RevocationReason::from_code(7), RevocationReason::Unspecified);
        assert_eq!(RevocationReason::from_code(10).to_string(), "aACompromise");
    }

    #[test]
    fn status_display_includes_reason() {
        let status = RevocationStatus::revoked(Some(1_700_000_000), Some(RevocationReason::Superseded));
        assert_eq!(status.to_string(), "revoked (superseded) at 1700000000");
        assert_eq!(RevocationStatus::unknown().to_string(), "unknown");
    }
}
