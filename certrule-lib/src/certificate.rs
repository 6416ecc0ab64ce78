//! Owned, immutable view of an X.509 certificate.
//!
//! [`Certificate`] keeps the DER encoding together with the fields the rules
//! need, so it can be shared between threads and stored in buckets without
//! borrowing from an input buffer.

use crate::fields::{AiaEntry, DateTime, DistinguishedName, Extension};
use crate::oid;
use crate::util;
use crate::CertError;
use digest::Digest;
use x509_parser::prelude::*;

/// A decoded X.509 certificate.
///
/// Construct with [`crate::parse_cert`], [`crate::parse_pem`] or
/// [`crate::parse_der`].
#[derive(Debug, Clone)]
pub struct Certificate {
    pub(crate) der: Vec<u8>,
    pub(crate) serial: String,
    pub(crate) subject: DistinguishedName,
    pub(crate) issuer: DistinguishedName,
    pub(crate) not_before: DateTime,
    pub(crate) not_after: DateTime,
    pub(crate) extensions: Vec<Extension>,
    pub(crate) aia: Vec<AiaEntry>,
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.der == other.der
    }
}

impl Eq for Certificate {}

impl Certificate {
    /// Subject distinguished name.
    pub fn subject(&self) -> &DistinguishedName {
        &self.subject
    }

    /// Issuer distinguished name.
    pub fn issuer(&self) -> &DistinguishedName {
        &self.issuer
    }

    /// Serial number as colon-separated hex, e.g. `03:E9`.
    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn not_before(&self) -> &DateTime {
        &self.not_before
    }

    pub fn not_after(&self) -> &DateTime {
        &self.not_after
    }

    /// DER encoding of the whole certificate.
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// All extensions, in encoded order.
    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    /// Look up an extension by dotted-decimal OID.
    pub fn extension(&self, oid: &str) -> Option<&Extension> {
        self.extensions.iter().find(|e| e.oid == oid)
    }

    /// Whether the Authority Information Access extension is present.
    pub fn has_authority_info_access(&self) -> bool {
        self.extension(oid::EXT_AUTHORITY_INFO_ACCESS).is_some()
    }

    /// OCSP responder URLs from the AIA extension.
    pub fn ocsp_urls(&self) -> Vec<String> {
        self.aia
            .iter()
            .filter(|e| e.method == "OCSP")
            .map(|e| e.location.clone())
            .collect()
    }

    /// SHA-256 fingerprint as colon-separated uppercase hex.
    pub fn fingerprint(&self) -> String {
        util::hex_colon_upper(&sha2::Sha256::digest(&self.der))
    }

    /// Whether subject and issuer names are identical.
    pub fn is_self_issued(&self) -> bool {
        self.subject == self.issuer
    }

    /// Self-issued and signed by its own key.
    pub fn is_self_signed(&self) -> bool {
        self.is_self_issued() && self.verify_signed_by(self).is_ok()
    }

    /// Verify this certificate's signature with `issuer`'s public key.
    pub fn verify_signed_by(&self, issuer: &Certificate) -> Result<(), CertError> {
        let (_, child) = X509Certificate::from_der(&self.der)
            .map_err(|e| CertError::Der(format!("{}", e)))?;
        let (_, parent) = X509Certificate::from_der(&issuer.der)
            .map_err(|e| CertError::Der(format!("{}", e)))?;
        child
            .verify_signature(Some(parent.public_key()))
            .map_err(|e| CertError::Signature(format!("{}", e)))
    }
}

impl std::fmt::Display for Certificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.subject, self.serial)
    }
}
