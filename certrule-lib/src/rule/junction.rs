//! Boolean combinators over rules.
//!
//! Children are evaluated in the order they were supplied. Junctions may be
//! nested to express arbitrary trust policies.
//!
//! Empty junctions are defined as follows: an empty [`AndJunction`] accepts
//! every certificate, an empty [`OrJunction`] or [`XorJunction`] rejects
//! every certificate with an empty [`ValidationError::NoneAccepted`].

use super::{RuleResult, ValidatorRule};
use crate::{Certificate, ValidationError};

/// Constructors for the junction family.
pub struct Junction;

impl Junction {
    pub fn and(rules: Vec<Box<dyn ValidatorRule>>) -> Box<dyn ValidatorRule> {
        Box::new(AndJunction::new(rules))
    }

    pub fn or(rules: Vec<Box<dyn ValidatorRule>>) -> Box<dyn ValidatorRule> {
        Box::new(OrJunction::new(rules))
    }

    pub fn xor(rules: Vec<Box<dyn ValidatorRule>>) -> Box<dyn ValidatorRule> {
        Box::new(XorJunction::new(rules))
    }
}

macro_rules! junction_common {
    ($name:ident) => {
        impl $name {
            pub fn new(rules: Vec<Box<dyn ValidatorRule>>) -> Self {
                $name { rules }
            }

            /// Append a child rule.
            pub fn push(mut self, rule: impl ValidatorRule + 'static) -> Self {
                self.rules.push(Box::new(rule));
                self
            }

            pub fn len(&self) -> usize {
                self.rules.len()
            }

            pub fn is_empty(&self) -> bool {
                self.rules.is_empty()
            }
        }

        impl FromIterator<Box<dyn ValidatorRule>> for $name {
            fn from_iter<I: IntoIterator<Item = Box<dyn ValidatorRule>>>(iter: I) -> Self {
                $name::new(iter.into_iter().collect())
            }
        }
    };
}

/// All children must accept. The first rejection is returned as-is and the
/// remaining children are not evaluated.
pub struct AndJunction {
    rules: Vec<Box<dyn ValidatorRule>>,
}

junction_common!(AndJunction);

impl ValidatorRule for AndJunction {
    fn validate(&self, certificate: &Certificate) -> RuleResult {
        for rule in &self.rules {
            rule.validate(certificate)?;
        }
        Ok(())
    }
}

/// At least one child must accept. Evaluation stops at the first
/// acceptance. When every child rejects, all of their errors are returned,
/// one per child in child order.
pub struct OrJunction {
    rules: Vec<Box<dyn ValidatorRule>>,
}

junction_common!(OrJunction);

impl ValidatorRule for OrJunction {
    fn validate(&self, certificate: &Certificate) -> RuleResult {
        let mut errors = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            match rule.validate(certificate) {
                Ok(()) => return Ok(()),
                Err(e) => errors.push(e),
            }
        }
        tracing::debug!(
            serial = certificate.serial(),
            rejected = errors.len(),
            "no alternative accepted certificate"
        );
        Err(ValidationError::NoneAccepted(errors))
    }
}

/// Exactly one child must accept. Every child is evaluated.
pub struct XorJunction {
    rules: Vec<Box<dyn ValidatorRule>>,
}

junction_common!(XorJunction);

impl ValidatorRule for XorJunction {
    fn validate(&self, certificate: &Certificate) -> RuleResult {
        let mut errors = Vec::new();
        let mut accepted = 0usize;
        for rule in &self.rules {
            match rule.validate(certificate) {
                Ok(()) => accepted += 1,
                Err(e) => errors.push(e),
            }
        }
        match accepted {
            1 => Ok(()),
            0 => Err(ValidationError::NoneAccepted(errors)),
            n => {
                tracing::debug!(
                    serial = certificate.serial(),
                    accepted = n,
                    "more than one exclusive alternative accepted certificate"
                );
                Err(ValidationError::failed(
                    certificate,
                    format!("{} exclusive alternatives accepted the certificate", n),
                ))
            }
        }
    }
}
