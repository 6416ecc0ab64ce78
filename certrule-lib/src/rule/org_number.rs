//! Norwegian organization number (organisasjonsnummer) detection.
//!
//! Enterprise certificates carry the 9-digit registry number either as the
//! subject `SERIALNUMBER` attribute, or appended to the organization name as
//! `O=Some Company - 123456789`. See SEID Leveranse 1, section 24.

use super::principal_name::{PrincipalNameProvider, ProviderError};
use super::{RuleResult, ValidatorRule};
use crate::dn::{self, DnError};
use crate::{Certificate, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;

#[allow(clippy::expect_used)]
static SERIALNUMBER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{9}$").expect("valid regex"));

#[allow(clippy::expect_used)]
static ORGANIZATION_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^.+-\W*([0-9]{9})$").expect("valid regex"));

/// Find the organization number in a subject name string.
///
/// `SERIALNUMBER` values are tried first, then `O` values; the first match
/// wins. Returns `Ok(None)` when neither attribute carries a number.
pub fn extract_organization_number(subject: &str) -> Result<Option<String>, DnError> {
    // C=NO,ST=AKERSHUS,L=FORNEBUVEIEN 1\, 1366 LYSAKER,O=RF Commfides,SERIALNUMBER=399573952,CN=RF Commfides
    if let Some(number) = dn::extract(subject, "SERIALNUMBER")?
        .into_iter()
        .find(|v| SERIALNUMBER_PATTERN.is_match(v))
    {
        return Ok(Some(number));
    }

    // CN=name, OU=None, O=organisasjon - 123456789, L=None, C=None
    Ok(dn::extract(subject, "O")?.iter().find_map(|v| {
        ORGANIZATION_NAME_PATTERN
            .captures(v)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }))
}

/// Accepts the certificate when its subject carries an organization number
/// that the provider accepts.
///
/// A missing number and a number the provider rejects produce the same
/// failure.
pub struct OrganizationNumberRule<P> {
    provider: P,
}

impl<P: PrincipalNameProvider> OrganizationNumberRule<P> {
    pub fn new(provider: P) -> Self {
        OrganizationNumberRule { provider }
    }

    /// The organization number of `certificate`, if any.
    pub fn extract_number(
        &self,
        certificate: &Certificate,
    ) -> Result<Option<String>, ValidationError> {
        extract_organization_number(&certificate.subject().to_rfc4514()).map_err(|e| {
            tracing::debug!(serial = certificate.serial(), error = %e, "unreadable subject name");
            ValidationError::infrastructure_caused_by(certificate, "unable to read subject name", e)
        })
    }
}

impl<P: PrincipalNameProvider> ValidatorRule for OrganizationNumberRule<P> {
    fn validate(&self, certificate: &Certificate) -> RuleResult {
        if let Some(number) = self.extract_number(certificate)? {
            match self.provider.validate(&number) {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(serial = certificate.serial(), error = %e, "organization number provider failed");
                    return Err(ValidationError::infrastructure_caused_by(
                        certificate,
                        "unable to check organization number",
                        e,
                    ));
                }
            }
        }

        tracing::debug!(serial = certificate.serial(), "organization number not detected");
        Err(ValidationError::failed(
            certificate,
            "organization number not detected",
        ))
    }
}

/// Accepts 9-digit numbers whose last digit is a valid MOD11 check digit
/// (weights 3, 2, 7, 6, 5, 4, 3, 2).
#[derive(Debug, Clone, Copy, Default)]
pub struct Mod11OrganizationNumber;

const MOD11_WEIGHTS: [u32; 8] = [3, 2, 7, 6, 5, 4, 3, 2];

impl PrincipalNameProvider for Mod11OrganizationNumber {
    fn validate(&self, value: &str) -> Result<bool, ProviderError> {
        let digits: Vec<u32> = value.chars().filter_map(|c| c.to_digit(10)).collect();
        if digits.len() != 9 || value.len() != 9 {
            return Err(ProviderError::Encoding(format!(
                "expected 9 digits, got {:?}",
                value
            )));
        }
        let (body, check) = digits.split_at(8);
        let sum: u32 = body
            .iter()
            .zip(MOD11_WEIGHTS.iter())
            .map(|(d, w)| d * w)
            .sum();
        let expected = match 11 - sum % 11 {
            11 => 0,
            10 => return Ok(false),
            n => n,
        };
        Ok(check.first() == Some(&expected))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn serialnumber_attribute_is_preferred() {
        let subject = "C=NO,O=RF Commfides - 987654321,SERIALNUMBER=399573952,CN=RF Commfides";
        assert_eq!(
            extract_organization_number(subject).unwrap().as_deref(),
            Some("399573952")
        );
    }

    #[test]
    fn organization_name_suffix_is_recognised() {
        let subject = "CN=name, OU=None, O=Some Company - 123456789, L=None, C=None";
        assert_eq!(
            extract_organization_number(subject).unwrap().as_deref(),
            Some("123456789")
        );
    }

    #[test]
    fn hyphen_without_spaces_is_recognised() {
        assert_eq!(
            extract_organization_number("O=Firma-123456789").unwrap().as_deref(),
            Some("123456789")
        );
    }

    #[test]
    fn malformed_serialnumber_falls_through_to_organization() {
        let subject = "SERIALNUMBER=12345,O=Firma AS - 974760673";
        assert_eq!(
            extract_organization_number(subject).unwrap().as_deref(),
            Some("974760673")
        );
    }

    #[test]
    fn ten_digits_do_not_match() {
        assert_eq!(
            extract_organization_number("SERIALNUMBER=1234567890,O=Firma - 1234567890").unwrap(),
            None
        );
    }

    #[test]
    fn number_without_hyphen_is_not_detected() {
        assert_eq!(
            extract_organization_number("O=Firma 123456789").unwrap(),
            None
        );
    }

    #[test]
    fn no_number_is_none() {
        assert_eq!(
            extract_organization_number("C=DK,O=Nothing Here AS,CN=Plain").unwrap(),
            None
        );
    }

    #[test]
    fn malformed_subject_is_an_error() {
        assert!(extract_organization_number("O").is_err());
    }

    #[test]
    fn mod11_checksum() {
        let provider = Mod11OrganizationNumber;
        assert!(provider.validate("974760673").unwrap());
        assert!(!provider.validate("974760674").unwrap());
        assert!(!provider.validate("123456789").unwrap());
        assert!(provider.validate("12345").is_err());
        assert!(provider.validate("97476067x").is_err());
    }
}
