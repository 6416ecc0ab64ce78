//! Certificate buckets: queryable sets of trusted or intermediate
//! certificates used for issuer resolution.
//!
//! Two implementations are provided:
//! - [`SimpleCertificateBucket`], an in-memory set built from certificates,
//!   PEM bundles, PEM directories or the system trust store.
//! - [`KeyStoreCertificateBucket`], decoded from a passphrase-protected
//!   PKCS#12 store.
//!
//! Both are immutable once built and safe to share between threads.

mod keystore;
mod simple;

use crate::{CertError, Certificate, DistinguishedName};

pub use keystore::KeyStoreCertificateBucket;
pub use simple::{find_system_ca_bundle, SimpleCertificateBucket};

/// Errors raised while building a bucket. A bucket that failed to build is
/// never returned partially filled.
#[derive(Debug, thiserror::Error)]
pub enum BucketError {
    #[error("no certificate source supplied")]
    EmptySource,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed certificate store: {0}")]
    Malformed(String),

    #[error("wrong passphrase for certificate store")]
    WrongPassphrase,

    #[error("invalid certificate in store: {0}")]
    Certificate(#[from] CertError),

    #[error("no system trust store found")]
    NoSystemStore,
}

/// A set of certificates that can be searched by name.
///
/// Lookups return at most one certificate. When several certificates share
/// the requested name, the first one in insertion order wins.
pub trait CertificateBucket: Send + Sync {
    /// All certificates, in insertion order.
    fn certificates(&self) -> &[Certificate];

    /// The first certificate whose subject equals `name`.
    fn find_by_subject(&self, name: &DistinguishedName) -> Option<&Certificate> {
        self.certificates().iter().find(|c| c.subject() == name)
    }

    /// The first certificate whose issuer equals `name`.
    fn find_by_issuer(&self, name: &DistinguishedName) -> Option<&Certificate> {
        self.certificates().iter().find(|c| c.issuer() == name)
    }

    fn iter(&self) -> std::slice::Iter<'_, Certificate> {
        self.certificates().iter()
    }

    fn len(&self) -> usize {
        self.certificates().len()
    }

    fn is_empty(&self) -> bool {
        self.certificates().is_empty()
    }

    /// Copy the contents into a plain in-memory bucket.
    fn to_simple(&self) -> SimpleCertificateBucket {
        SimpleCertificateBucket::new(self.certificates().to_vec())
    }
}
