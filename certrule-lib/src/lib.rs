//! certrule-lib: composable trust rules for X.509 certificates.
//!
//! A [`Validator`] holds a root [`ValidatorRule`], usually a [`Junction`] of
//! smaller rules, and accepts or rejects certificates with a single
//! [`Validator::validate`] call. Rules consult [`CertificateBucket`]s for
//! issuer lookups, [`PrincipalNameProvider`]s for identity checks, and a
//! [`RevocationResponder`] for OCSP status.
//!
//! ```no_run
//! use certrule_lib::{
//!     parse_cert, PrincipalNameRule, SimplePrincipalNameProvider, ValidatorBuilder,
//! };
//!
//! let validator = ValidatorBuilder::new()
//!     .add_rule(PrincipalNameRule::attribute(
//!         "C",
//!         SimplePrincipalNameProvider::new(["NO"]),
//!     ))
//!     .build();
//!
//! let cert = parse_cert(&std::fs::read("leaf.pem")?)?;
//! validator.validate(&cert)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bucket;
mod certificate;
pub mod dn;
mod fields;
pub mod oid;
mod parser;
pub mod rule;
mod util;
mod validator;

pub use bucket::{
    find_system_ca_bundle, BucketError, CertificateBucket, KeyStoreCertificateBucket,
    SimpleCertificateBucket,
};
pub use certificate::Certificate;
pub use fields::{AiaEntry, DateTime, DistinguishedName, Extension, NameComponent};
pub use parser::{parse_cert, parse_der, parse_pem, parse_pem_chain};
pub use rule::{
    chain::ChainRule,
    critical_extension::CriticalExtensionRule,
    expiration::ExpirationRule,
    junction::{AndJunction, Junction, OrJunction, XorJunction},
    ocsp::{
        CertStatus, OcspRequest, OcspRule, ResponderError, RevocationReason,
        RevocationResponder, RevocationStatus,
    },
    org_number::{extract_organization_number, Mod11OrganizationNumber, OrganizationNumberRule},
    principal_name::{
        Principal, PrincipalNameProvider, PrincipalNameRule, ProviderError,
        SimplePrincipalNameProvider,
    },
    signing::SigningRule,
    RuleResult, ValidatorRule,
};
pub use validator::{ValidationReport, Validator, ValidatorBuilder};

/// Errors from decoding or inspecting a certificate.
#[derive(Debug, thiserror::Error)]
pub enum CertError {
    #[error("Failed to parse certificate: {0}")]
    Parse(String),

    #[error("Invalid PEM format: {0}")]
    Pem(String),

    #[error("Invalid DER format: {0}")]
    Der(String),

    #[error("Signature verification failed: {0}")]
    Signature(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a rule did not accept a certificate.
///
/// `Failed` means the certificate was evaluated and rejected.
/// `Infrastructure` means the rule could not reach a decision because a
/// collaborator failed (issuer missing from a bucket, responder unreachable,
/// malformed name). Callers that want to retry or alert can tell the two
/// apart with [`is_failed`](Self::is_failed) and
/// [`is_infrastructure`](Self::is_infrastructure).
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("{reason} (serial {serial})")]
    Failed { reason: String, serial: String },

    #[error("unable to validate: {reason} (serial {serial})")]
    Infrastructure {
        reason: String,
        serial: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Every alternative of an OR/XOR junction rejected the certificate.
    /// Holds one error per child, in child order.
    #[error("no alternative accepted the certificate ({} rejected)", .0.len())]
    NoneAccepted(Vec<ValidationError>),
}

impl ValidationError {
    pub fn failed(cert: &Certificate, reason: impl Into<String>) -> Self {
        ValidationError::Failed {
            reason: reason.into(),
            serial: cert.serial().to_string(),
        }
    }

    pub fn infrastructure(cert: &Certificate, reason: impl Into<String>) -> Self {
        ValidationError::Infrastructure {
            reason: reason.into(),
            serial: cert.serial().to_string(),
            source: None,
        }
    }

    /// Like [`infrastructure`](Self::infrastructure), keeping the underlying
    /// collaborator error as the `source`.
    pub fn infrastructure_caused_by(
        cert: &Certificate,
        reason: impl Into<String>,
        cause: impl Into<BoxError>,
    ) -> Self {
        ValidationError::Infrastructure {
            reason: reason.into(),
            serial: cert.serial().to_string(),
            source: Some(cause.into()),
        }
    }

    /// The certificate was judged and rejected.
    ///
    /// An aggregate counts as failed when any of its children is a failure;
    /// it is only infrastructure when every alternative was undeterminable.
    pub fn is_failed(&self) -> bool {
        match self {
            ValidationError::Failed { .. } => true,
            ValidationError::Infrastructure { .. } => false,
            ValidationError::NoneAccepted(errors) => {
                errors.is_empty() || errors.iter().any(ValidationError::is_failed)
            }
        }
    }

    /// No decision could be made.
    pub fn is_infrastructure(&self) -> bool {
        !self.is_failed()
    }

    /// The serial number of the certificate under validation, when known.
    pub fn serial(&self) -> Option<&str> {
        match self {
            ValidationError::Failed { serial, .. }
            | ValidationError::Infrastructure { serial, .. } => Some(serial),
            ValidationError::NoneAccepted(errors) => errors.iter().find_map(|e| e.serial()),
        }
    }

    /// Short category label used in logs and reports.
    pub fn category(&self) -> &'static str {
        if self.is_failed() {
            "failed"
        } else {
            "infrastructure"
        }
    }
}
