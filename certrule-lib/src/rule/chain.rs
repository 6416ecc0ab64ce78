//! Chain-of-issuance check via DFS path finding.
//!
//! Starting from the certificate under validation, candidate issuers are
//! taken from the intermediate bucket until one of them is issued by a
//! certificate in the root bucket. Every link's signature is verified, and
//! backtracking handles cross-signed or duplicate intermediates.

use super::{RuleResult, ValidatorRule};
use crate::{Certificate, CertificateBucket, ValidationError};
use std::sync::Arc;

/// Maximum chain depth to prevent infinite loops during chain building.
pub(crate) const MAX_CHAIN_DEPTH: usize = 32;

/// Requires a verifiable path from the certificate to a trusted root.
pub struct ChainRule {
    roots: Arc<dyn CertificateBucket>,
    intermediates: Arc<dyn CertificateBucket>,
}

impl ChainRule {
    pub fn new(
        roots: Arc<dyn CertificateBucket>,
        intermediates: Arc<dyn CertificateBucket>,
    ) -> Self {
        ChainRule {
            roots,
            intermediates,
        }
    }

    /// Find the chain from `leaf` up to and including its trust anchor.
    /// Returns `None` when no path exists.
    pub fn find_path<'a>(&'a self, leaf: &'a Certificate) -> Option<Vec<&'a Certificate>> {
        let mut search = self.search(leaf);
        search.dfs(leaf).then_some(search.chain)
    }

    fn search<'a>(&'a self, leaf: &'a Certificate) -> Search<'a> {
        Search {
            roots: self.roots.certificates(),
            intermediates: self.intermediates.certificates(),
            used: vec![false; self.intermediates.len()],
            chain: vec![leaf],
            signature_mismatch: false,
        }
    }
}

struct Search<'a> {
    roots: &'a [Certificate],
    intermediates: &'a [Certificate],
    used: Vec<bool>,
    chain: Vec<&'a Certificate>,
    signature_mismatch: bool,
}

impl<'a> Search<'a> {
    /// Returns true when `chain` ends at a trust anchor.
    #[allow(clippy::indexing_slicing)] // used[idx] safe: idx from intermediates.iter().enumerate(), same len
    fn dfs(&mut self, current: &'a Certificate) -> bool {
        let (roots, intermediates) = (self.roots, self.intermediates);

        // The certificate itself is trusted.
        if roots.contains(current) {
            return true;
        }

        for root in roots.iter().filter(|r| r.subject() == current.issuer()) {
            if current.verify_signed_by(root).is_ok() {
                if root != current {
                    self.chain.push(root);
                }
                return true;
            }
            self.signature_mismatch = true;
        }

        if self.chain.len() >= MAX_CHAIN_DEPTH {
            return false;
        }

        for (idx, candidate) in intermediates.iter().enumerate() {
            if self.used[idx] || candidate.subject() != current.issuer() || candidate == current {
                continue;
            }
            if current.verify_signed_by(candidate).is_err() {
                self.signature_mismatch = true;
                continue;
            }

            self.used[idx] = true;
            self.chain.push(candidate);

            if self.dfs(candidate) {
                return true;
            }

            self.chain.pop();
            self.used[idx] = false;
        }

        false
    }
}

impl ValidatorRule for ChainRule {
    fn validate(&self, certificate: &Certificate) -> RuleResult {
        let mut search = self.search(certificate);
        if search.dfs(certificate) {
            tracing::trace!(
                serial = certificate.serial(),
                depth = search.chain.len(),
                "chain to trusted root found"
            );
            return Ok(());
        }

        let reason = if search.signature_mismatch {
            "no path to a trusted root: issuer signature mismatch"
        } else {
            "no path to a trusted root"
        };
        tracing::debug!(serial = certificate.serial(), "{}", reason);
        Err(ValidationError::failed(certificate, reason))
    }
}
