//! Certificate bucket backed by a PKCS#12 key store.

use super::{BucketError, CertificateBucket, SimpleCertificateBucket};
use crate::{parse_der, Certificate, DistinguishedName};
use std::io::Read;
use std::path::Path;

/// Certificates decoded from a passphrase-protected PKCS#12 store.
///
/// The store is read completely at construction time. Only certificate bags
/// are used; private keys, if present, are ignored.
#[derive(Debug, Clone)]
pub struct KeyStoreCertificateBucket {
    inner: SimpleCertificateBucket,
}

impl KeyStoreCertificateBucket {
    /// Decode a PKCS#12 store held in memory.
    pub fn from_pkcs12(data: &[u8], passphrase: &str) -> Result<Self, BucketError> {
        if data.is_empty() {
            return Err(BucketError::EmptySource);
        }

        let pfx =
            p12::PFX::parse(data).map_err(|e| BucketError::Malformed(format!("{:?}", e)))?;
        if !pfx.verify_mac(passphrase) {
            return Err(BucketError::WrongPassphrase);
        }

        let certificates = pfx
            .cert_x509_bags(passphrase)
            .map_err(|e| BucketError::Malformed(format!("{:?}", e)))?
            .iter()
            .map(|der| parse_der(der))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(count = certificates.len(), "loaded PKCS#12 certificate store");

        Ok(KeyStoreCertificateBucket {
            inner: SimpleCertificateBucket::new(certificates),
        })
    }

    /// Read a PKCS#12 store from any reader.
    pub fn from_reader<R: Read>(mut reader: R, passphrase: &str) -> Result<Self, BucketError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_pkcs12(&data, passphrase)
    }

    /// Read a PKCS#12 store from a file.
    pub fn from_file(path: impl AsRef<Path>, passphrase: &str) -> Result<Self, BucketError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            BucketError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        Self::from_pkcs12(&data, passphrase)
    }
}

impl CertificateBucket for KeyStoreCertificateBucket {
    fn certificates(&self) -> &[Certificate] {
        self.inner.certificates()
    }

    fn find_by_subject(&self, name: &DistinguishedName) -> Option<&Certificate> {
        self.inner.find_by_subject(name)
    }

    fn to_simple(&self) -> SimpleCertificateBucket {
        self.inner.clone()
    }
}
