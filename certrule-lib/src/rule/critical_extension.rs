//! Critical extension policy.

use super::{RuleResult, ValidatorRule};
use crate::{Certificate, ValidationError};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Recognizes,
    Requires,
}

/// Checks critical extensions against a list of OIDs.
///
/// - [`recognizes`](Self::recognizes): every critical extension in the
///   certificate must be on the list. Non-critical extensions are ignored.
/// - [`requires`](Self::requires): every listed OID must be present and
///   marked critical.
#[derive(Debug, Clone)]
pub struct CriticalExtensionRule {
    oids: HashSet<String>,
    mode: Mode,
}

impl CriticalExtensionRule {
    pub fn recognizes<I, S>(oids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CriticalExtensionRule {
            oids: oids.into_iter().map(Into::into).collect(),
            mode: Mode::Recognizes,
        }
    }

    pub fn requires<I, S>(oids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CriticalExtensionRule {
            oids: oids.into_iter().map(Into::into).collect(),
            mode: Mode::Requires,
        }
    }
}

impl ValidatorRule for CriticalExtensionRule {
    fn validate(&self, certificate: &Certificate) -> RuleResult {
        match self.mode {
            Mode::Recognizes => {
                if let Some(ext) = certificate
                    .extensions()
                    .iter()
                    .find(|e| e.critical && !self.oids.contains(&e.oid))
                {
                    tracing::debug!(serial = certificate.serial(), oid = %ext.oid, "unrecognized critical extension");
                    return Err(ValidationError::failed(
                        certificate,
                        format!("unrecognized critical extension {}", ext.oid),
                    ));
                }
            }
            Mode::Requires => {
                let mut missing: Vec<&str> = self
                    .oids
                    .iter()
                    .filter(|oid| {
                        !certificate
                            .extension(oid)
                            .map(|e| e.critical)
                            .unwrap_or(false)
                    })
                    .map(String::as_str)
                    .collect();
                if !missing.is_empty() {
                    missing.sort_unstable();
                    tracing::debug!(serial = certificate.serial(), "required critical extension missing");
                    return Err(ValidationError::failed(
                        certificate,
                        format!("missing critical extension {}", missing.join(", ")),
                    ));
                }
            }
        }
        Ok(())
    }
}
