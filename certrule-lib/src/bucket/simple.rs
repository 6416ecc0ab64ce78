//! In-memory certificate bucket.

use super::{BucketError, CertificateBucket};
use crate::{parse_der, parse_pem_chain, Certificate, DistinguishedName};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Well-known CA bundle file paths, in order of preference.
pub(crate) const KNOWN_CA_BUNDLE_PATHS: &[&str] = &[
    "/etc/ssl/certs/ca-certificates.crt", // Debian/Ubuntu
    "/etc/pki/tls/certs/ca-bundle.crt",   // RHEL/CentOS/Fedora
    "/etc/ssl/ca-bundle.pem",             // openSUSE
    "/etc/ssl/cert.pem",                  // macOS, Alpine
];

/// Well-known CA certificate directory paths.
pub(crate) const KNOWN_CA_DIR_PATHS: &[&str] = &["/etc/ssl/certs"];

/// Check if a file looks like a PEM certificate file.
///
/// Matches `.pem`, `.crt`, `.cer` extensions and OpenSSL hash-linked files
/// (`XXXXXXXX.N` where the extension is a single digit).
fn is_pem_cert_file(path: &Path) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e,
        None => return false,
    };
    matches!(ext, "pem" | "crt" | "cer")
        || (ext.len() == 1 && ext.bytes().next().is_some_and(|b| b.is_ascii_digit()))
}

/// An immutable, in-memory set of certificates indexed by subject.
#[derive(Clone, Default)]
pub struct SimpleCertificateBucket {
    certificates: Vec<Certificate>,
    /// Canonical subject name -> index of the first certificate with that subject.
    by_subject: HashMap<String, usize>,
}

impl std::fmt::Debug for SimpleCertificateBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleCertificateBucket")
            .field("count", &self.certificates.len())
            .finish()
    }
}

impl SimpleCertificateBucket {
    pub fn new(certificates: Vec<Certificate>) -> Self {
        let mut by_subject = HashMap::new();
        for (idx, cert) in certificates.iter().enumerate() {
            by_subject
                .entry(cert.subject().canonical().to_string())
                .or_insert(idx);
        }
        SimpleCertificateBucket {
            certificates,
            by_subject,
        }
    }

    /// Build a bucket from a PEM bundle. Every certificate in the bundle must
    /// decode; the first one that does not aborts construction.
    pub fn from_pem(pem_data: &[u8]) -> Result<Self, BucketError> {
        if pem_data.is_empty() {
            return Err(BucketError::EmptySource);
        }
        let certificates = parse_pem_chain(pem_data)?
            .iter()
            .map(|der| parse_der(der))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(certificates))
    }

    /// Build a bucket from a PEM file path.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self, BucketError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| {
            BucketError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", path.display(), e),
            ))
        })?;
        Self::from_pem(&data)
    }

    /// Load every PEM certificate file in a directory (like OpenSSL's
    /// `-CApath`). Files are read in name order so lookups are deterministic.
    pub fn from_pem_directory(dir: impl AsRef<Path>) -> Result<Self, BucketError> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir).map_err(|e| {
            BucketError::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", dir.display(), e),
            ))
        })?;
        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && is_pem_cert_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut certificates = Vec::new();
        for path in paths {
            certificates.extend(Self::from_pem_file(&path)?.certificates);
        }
        Ok(Self::new(certificates))
    }

    /// Load the system trust store, searching the same locations as OpenSSL:
    /// 1. `SSL_CERT_FILE` or the bundle found by `openssl-probe`, then
    ///    [`KNOWN_CA_BUNDLE_PATHS`]
    /// 2. `SSL_CERT_DIR` or the directory found by `openssl-probe`, then
    ///    [`KNOWN_CA_DIR_PATHS`]
    ///
    /// System bundles sometimes carry entries this decoder rejects; those are
    /// skipped rather than failing the whole store.
    pub fn system() -> Result<Self, BucketError> {
        if let Some(bundle_path) = find_system_ca_bundle() {
            if let Ok(data) = std::fs::read(&bundle_path) {
                let certificates = decode_lenient(&data);
                if !certificates.is_empty() {
                    tracing::debug!(
                        path = %bundle_path.display(),
                        count = certificates.len(),
                        "loaded system CA bundle"
                    );
                    return Ok(Self::new(certificates));
                }
            }
        }

        let ssl_paths = openssl_probe::probe();
        let dir_candidates = std::env::var("SSL_CERT_DIR")
            .ok()
            .into_iter()
            .chain(
                ssl_paths
                    .cert_dir
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned()),
            )
            .chain(KNOWN_CA_DIR_PATHS.iter().map(|s| (*s).to_string()));

        for dir in dir_candidates {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            let mut certificates = Vec::new();
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() && is_pem_cert_file(&path) {
                    if let Ok(data) = std::fs::read(&path) {
                        certificates.extend(decode_lenient(&data));
                    }
                }
            }
            if !certificates.is_empty() {
                tracing::debug!(dir = %dir, count = certificates.len(), "loaded system CA directory");
                return Ok(Self::new(certificates));
            }
        }

        Err(BucketError::NoSystemStore)
    }

    /// Whether this exact certificate (by DER encoding) is in the bucket.
    pub fn contains(&self, cert: &Certificate) -> bool {
        self.certificates.iter().any(|c| c == cert)
    }
}

fn decode_lenient(pem_data: &[u8]) -> Vec<Certificate> {
    parse_pem_chain(pem_data)
        .map(|ders| ders.iter().filter_map(|der| parse_der(der).ok()).collect())
        .unwrap_or_default()
}

impl CertificateBucket for SimpleCertificateBucket {
    fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    fn find_by_subject(&self, name: &DistinguishedName) -> Option<&Certificate> {
        self.by_subject
            .get(name.canonical())
            .and_then(|&idx| self.certificates.get(idx))
    }
}

impl FromIterator<Certificate> for SimpleCertificateBucket {
    fn from_iter<I: IntoIterator<Item = Certificate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Find the system CA bundle path (same location OpenSSL uses).
///
/// Checks, in order:
/// 1. `SSL_CERT_FILE` environment variable
/// 2. Path discovered by `openssl-probe`
/// 3. Well-known bundle file paths ([`KNOWN_CA_BUNDLE_PATHS`])
pub fn find_system_ca_bundle() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("SSL_CERT_FILE") {
        let p = PathBuf::from(&path);
        if p.exists() {
            return Some(p);
        }
    }

    let ssl_paths = openssl_probe::probe();
    if let Some(file) = ssl_paths.cert_file {
        let path = PathBuf::from(&file);
        if path.exists() {
            return Some(path);
        }
    }

    KNOWN_CA_BUNDLE_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}
