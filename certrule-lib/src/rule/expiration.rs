//! Validity-window check.

use super::{RuleResult, ValidatorRule};
use crate::{Certificate, ValidationError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Rejects certificates that are not yet valid or have expired.
///
/// By default the current system time is used. [`at_time`](Self::at_time)
/// pins the evaluation time (Unix seconds), and [`margin`](Self::margin)
/// additionally requires the certificate to stay valid for the given period.
#[derive(Debug, Clone, Default)]
pub struct ExpirationRule {
    at_time: Option<i64>,
    margin: Duration,
}

impl ExpirationRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at_time(mut self, timestamp: i64) -> Self {
        self.at_time = Some(timestamp);
        self
    }

    pub fn margin(mut self, margin: Duration) -> Self {
        self.margin = margin;
        self
    }

    fn now(&self) -> i64 {
        self.at_time.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs() as i64
        })
    }
}

impl ValidatorRule for ExpirationRule {
    fn validate(&self, certificate: &Certificate) -> RuleResult {
        let now = self.now();

        if now < certificate.not_before().timestamp {
            tracing::debug!(serial = certificate.serial(), "certificate not yet valid");
            return Err(ValidationError::failed(
                certificate,
                format!("certificate is not valid before {}", certificate.not_before()),
            ));
        }

        let margin = i64::try_from(self.margin.as_secs()).unwrap_or(i64::MAX);
        if now.saturating_add(margin) > certificate.not_after().timestamp {
            tracing::debug!(serial = certificate.serial(), "certificate expired");
            let reason = if now > certificate.not_after().timestamp {
                format!("certificate expired at {}", certificate.not_after())
            } else {
                format!(
                    "certificate expires at {}, within {}s",
                    certificate.not_after(),
                    margin
                )
            };
            return Err(ValidationError::failed(certificate, reason));
        }

        Ok(())
    }
}
