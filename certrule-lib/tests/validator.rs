#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Validator construction, byte input, reports and log routing.

mod common;

use certrule_lib::{
    rule, PrincipalNameRule, SimplePrincipalNameProvider, ValidationError, Validator,
    ValidatorBuilder,
};
use common::{load, read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn norway() -> PrincipalNameRule<SimplePrincipalNameProvider> {
    PrincipalNameRule::attribute("C", SimplePrincipalNameProvider::new(["NO"]))
}

#[test]
fn empty_builder_accepts_everything() {
    let validator = ValidatorBuilder::new().build();
    assert!(validator.is_valid(&load("plain-dk.pem")));
    assert!(validator.is_valid(&load("stranger.pem")));
}

#[test]
fn single_rule_is_the_root() {
    let validator = ValidatorBuilder::new().add_rule(norway()).build();
    validator.validate(&load("ap-company.pem")).unwrap();
    let err = validator.validate(&load("plain-dk.pem")).unwrap_err();
    assert!(matches!(err, ValidationError::Failed { .. }));
}

#[test]
fn several_rules_must_all_accept_in_order() {
    let second_calls = Arc::new(AtomicUsize::new(0));
    let counter = second_calls.clone();
    let validator = ValidatorBuilder::new()
        .add_rule(norway())
        .add_rule(rule::from_fn(move |_cert| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
        .build();

    assert!(validator.is_valid(&load("ap-company.pem")));
    assert!(!validator.is_valid(&load("plain-dk.pem")));
    // The second rule is skipped once the first rejects.
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn validator_wraps_existing_rule() {
    let validator = Validator::new(norway());
    assert!(validator.is_valid(&load("smp-commfides.pem")));
}

#[test]
fn validate_bytes_accepts_pem_and_der() {
    let validator = ValidatorBuilder::new().add_rule(norway()).build();
    validator.validate_bytes(&read("ap-company.pem")).unwrap();
    validator.validate_bytes(&read("ap-company.der")).unwrap();
}

#[test]
fn validate_bytes_decode_failure_is_infrastructure() {
    let validator = ValidatorBuilder::new().build();
    let err = validator.validate_bytes(b"definitely not a certificate").unwrap_err();
    assert!(err.is_infrastructure());
    assert_eq!(err.category(), "infrastructure");
    assert!(validator.validate_bytes(&[]).is_err());
}

#[test]
fn report_for_accepted_certificate() {
    let validator = ValidatorBuilder::new().add_rule(norway()).build();
    let report = validator.report(&load("ap-company.pem"));
    assert!(report.is_valid);
    assert!(report.errors.is_empty());
    assert_eq!(report.serial, "03:E9");
    assert!(report.to_string().ends_with(", 03:E9, OK"));

    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["is_valid"], true);
    assert!(json.get("category").is_none());
}

#[test]
fn report_flattens_alternatives() {
    let validator = ValidatorBuilder::new()
        .add_rule(certrule_lib::Junction::or(vec![
            Box::new(norway()) as Box<dyn certrule_lib::ValidatorRule>,
            Box::new(PrincipalNameRule::attribute(
                "C",
                SimplePrincipalNameProvider::new(["SE"]),
            )),
        ]))
        .build();
    let report = validator.report(&load("plain-dk.pem"));
    assert!(!report.is_valid);
    assert_eq!(report.category, Some("failed"));
    assert_eq!(report.errors.len(), 2);
    assert!(report.to_string().contains("FAIL"));

    let json: serde_json::Value = serde_json::to_value(&report).unwrap();
    assert_eq!(json["category"], "failed");
    assert_eq!(json["errors"].as_array().unwrap().len(), 2);
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

#[test]
fn injected_dispatch_receives_rejections() {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    let validator = ValidatorBuilder::new()
        .add_rule(norway())
        .with_dispatch(tracing::Dispatch::new(subscriber))
        .build();

    validator.validate(&load("ap-company.pem")).unwrap();
    assert!(!captured.text().contains("certificate rejected"));

    validator.validate(&load("plain-dk.pem")).unwrap_err();
    let logs = captured.text();
    assert!(logs.contains("certificate rejected"), "{logs}");
    assert!(logs.contains("03:EB"), "{logs}");
}

#[test]
fn validator_is_shareable_across_threads() {
    let validator = Arc::new(ValidatorBuilder::new().add_rule(norway()).build());
    let certs = [load("ap-company.pem"), load("plain-dk.pem")];
    std::thread::scope(|s| {
        for _ in 0..4 {
            let validator = &validator;
            let certs = &certs;
            s.spawn(move || {
                assert!(validator.is_valid(&certs[0]));
                assert!(!validator.is_valid(&certs[1]));
            });
        }
    });
}
