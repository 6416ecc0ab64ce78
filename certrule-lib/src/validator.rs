//! Entry point: a root rule plus the logging sink it reports to.

use crate::rule::junction::AndJunction;
use crate::{parse_cert, Certificate, RuleResult, ValidationError, ValidatorRule};
use serde::Serialize;

/// Evaluates certificates against a fixed root rule.
///
/// A validator is immutable and can be shared between threads; concurrent
/// calls to [`validate`](Self::validate) do not interfere.
pub struct Validator {
    root: Box<dyn ValidatorRule>,
    dispatch: Option<tracing::Dispatch>,
}

impl Validator {
    /// Wrap an existing rule.
    pub fn new(root: impl ValidatorRule + 'static) -> Self {
        Validator {
            root: Box::new(root),
            dispatch: None,
        }
    }

    /// Accept the certificate or explain why not.
    pub fn validate(&self, certificate: &Certificate) -> RuleResult {
        match &self.dispatch {
            Some(dispatch) => {
                tracing::dispatcher::with_default(dispatch, || self.evaluate(certificate))
            }
            None => self.evaluate(certificate),
        }
    }

    /// Decode a PEM or DER certificate and validate it. Decoding failures
    /// are reported as infrastructure errors.
    pub fn validate_bytes(&self, input: &[u8]) -> RuleResult {
        let certificate = parse_cert(input).map_err(|e| ValidationError::Infrastructure {
            reason: "unable to decode certificate".into(),
            serial: "unknown".into(),
            source: Some(Box::new(e)),
        })?;
        self.validate(&certificate)
    }

    pub fn is_valid(&self, certificate: &Certificate) -> bool {
        self.validate(certificate).is_ok()
    }

    /// Validate and summarize the outcome for display or JSON output.
    pub fn report(&self, certificate: &Certificate) -> ValidationReport {
        ValidationReport::new(certificate, self.validate(certificate))
    }

    fn evaluate(&self, certificate: &Certificate) -> RuleResult {
        tracing::trace!(serial = certificate.serial(), subject = %certificate.subject(), "validating");
        let result = self.root.validate(certificate);
        if let Err(e) = &result {
            tracing::debug!(
                serial = certificate.serial(),
                category = e.category(),
                error = %e,
                "certificate rejected"
            );
        }
        result
    }
}

/// Collects rules for a [`Validator`].
///
/// With a single rule, that rule becomes the root. Several rules are
/// combined in an [`AndJunction`] in the order they were added. A builder
/// with no rules yields a validator that accepts every certificate.
#[derive(Default)]
pub struct ValidatorBuilder {
    rules: Vec<Box<dyn ValidatorRule>>,
    dispatch: Option<tracing::Dispatch>,
}

impl ValidatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_rule(mut self, rule: impl ValidatorRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Route this validator's log events to `dispatch` instead of the
    /// global subscriber.
    pub fn with_dispatch(mut self, dispatch: tracing::Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    pub fn build(mut self) -> Validator {
        let root: Box<dyn ValidatorRule> = if self.rules.len() == 1 {
            match self.rules.pop() {
                Some(rule) => rule,
                None => Box::new(AndJunction::new(Vec::new())),
            }
        } else {
            Box::new(AndJunction::new(self.rules))
        };
        Validator {
            root,
            dispatch: self.dispatch,
        }
    }
}

/// Outcome of validating one certificate.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub subject: String,
    pub issuer: String,
    pub serial: String,
    pub fingerprint: String,
    pub is_valid: bool,
    /// `failed` or `infrastructure` when rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<&'static str>,
    /// Rejection reasons, one per failed rule.
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn new(certificate: &Certificate, result: RuleResult) -> Self {
        let (category, errors) = match result {
            Ok(()) => (None, Vec::new()),
            Err(e) => {
                let mut errors = Vec::new();
                flatten(&e, &mut errors);
                (Some(e.category()), errors)
            }
        };
        ValidationReport {
            subject: certificate.subject().to_string(),
            issuer: certificate.issuer().to_string(),
            serial: certificate.serial().to_string(),
            fingerprint: certificate.fingerprint(),
            is_valid: category.is_none(),
            category,
            errors,
        }
    }
}

fn flatten(error: &ValidationError, out: &mut Vec<String>) {
    match error {
        ValidationError::NoneAccepted(children) if !children.is_empty() => {
            for child in children {
                flatten(child, out);
            }
        }
        other => out.push(other.to_string()),
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: [subject], [serial], [OK/FAIL], [optional reason]
        write!(f, "{}, {}, ", self.subject, self.serial)?;
        if self.is_valid {
            write!(f, "OK")?;
        } else {
            write!(f, "FAIL")?;
            if !self.errors.is_empty() {
                write!(f, ", {}", self.errors.join("; "))?;
            }
        }
        Ok(())
    }
}
