#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Certificate bucket construction and lookup.

mod common;

use certrule_lib::{
    BucketError, CertificateBucket, KeyStoreCertificateBucket, SimpleCertificateBucket,
};
use common::{certs_dir, load, read};

const PASSWORD: &str = "changeit";

fn keystore() -> KeyStoreCertificateBucket {
    KeyStoreCertificateBucket::from_file(certs_dir().join("truststore.p12"), PASSWORD).unwrap()
}

#[test]
fn keystore_loads_all_certificates() {
    let bucket = keystore();
    assert_eq!(bucket.len(), 2);
    let subjects: Vec<String> = bucket.iter().map(|c| c.subject().to_string()).collect();
    assert!(subjects.iter().any(|s| s.contains("Test Root CA")));
    assert!(subjects.iter().any(|s| s.contains("Test Issuing CA")));
}

#[test]
fn keystore_finds_issuer_of_access_point_certificate() {
    let bucket = keystore();
    let leaf = load("ap-company.pem");
    let issuer = bucket.find_by_subject(leaf.issuer()).unwrap();
    assert_eq!(issuer.subject(), leaf.issuer());
    assert!(leaf.verify_signed_by(issuer).is_ok());
}

#[test]
fn keystore_finds_issuer_of_smp_certificate() {
    let bucket = keystore();
    let leaf = load("smp-commfides.pem");
    assert!(bucket.find_by_subject(leaf.issuer()).is_some());
}

#[test]
fn keystore_has_no_issuer_for_foreign_certificate() {
    let bucket = keystore();
    let leaf = load("stranger.pem");
    assert!(bucket.find_by_subject(leaf.issuer()).is_none());
}

#[test]
fn keystore_find_by_issuer() {
    let bucket = keystore();
    let root = load("root.pem");
    // Both the root (self-issued) and the intermediate carry the root's name
    // as issuer; insertion order decides.
    let found = bucket.find_by_issuer(root.subject()).unwrap();
    assert_eq!(found.issuer(), root.subject());
}

#[test]
fn keystore_missing_file_is_io_error() {
    let err = KeyStoreCertificateBucket::from_file(certs_dir().join("nope.p12"), PASSWORD)
        .unwrap_err();
    assert!(matches!(err, BucketError::Io(_)), "{err:?}");
}

#[test]
fn keystore_empty_input_is_rejected() {
    let err = KeyStoreCertificateBucket::from_pkcs12(&[], PASSWORD).unwrap_err();
    assert!(matches!(err, BucketError::EmptySource));

    let err = KeyStoreCertificateBucket::from_reader(std::io::empty(), PASSWORD).unwrap_err();
    assert!(matches!(err, BucketError::EmptySource));
}

#[test]
fn keystore_wrong_password_is_rejected() {
    let err = KeyStoreCertificateBucket::from_pkcs12(&read("truststore.p12"), "wrong")
        .unwrap_err();
    assert!(matches!(err, BucketError::WrongPassphrase), "{err:?}");
}

#[test]
fn keystore_garbage_is_malformed() {
    let err = KeyStoreCertificateBucket::from_pkcs12(b"not a key store", PASSWORD).unwrap_err();
    assert!(matches!(err, BucketError::Malformed(_)), "{err:?}");
}

#[test]
fn keystore_to_simple_preserves_contents() {
    let bucket = keystore();
    let simple = bucket.to_simple();
    assert_eq!(simple.len(), bucket.len());
    for cert in bucket.iter() {
        assert!(simple.contains(cert));
    }
}

#[test]
fn simple_bucket_from_pem_bundle() {
    let bucket = SimpleCertificateBucket::from_pem(&read("bundle.pem")).unwrap();
    assert_eq!(bucket.len(), 2);
    let leaf = load("plain-dk.pem");
    let issuer = bucket.find_by_subject(leaf.issuer()).unwrap();
    assert_eq!(issuer.serial(), "10:00");
}

#[test]
fn simple_bucket_from_directory_reads_every_pem() {
    let bucket = SimpleCertificateBucket::from_pem_directory(certs_dir()).unwrap();
    // bundle.pem repeats root and intermediate
    assert!(bucket.len() >= 8);
    assert!(bucket.contains(&load("other-root.pem")));
}

#[test]
fn simple_bucket_empty_source() {
    let err = SimpleCertificateBucket::from_pem(b"").unwrap_err();
    assert!(matches!(err, BucketError::EmptySource));
}

#[test]
fn simple_bucket_rejects_non_pem() {
    let err = SimpleCertificateBucket::from_pem(b"hello").unwrap_err();
    assert!(matches!(err, BucketError::Certificate(_)), "{err:?}");
}

#[test]
fn duplicate_subjects_first_wins() {
    let root = load("root.pem");
    let intermediate = load("intermediate.pem");
    let bucket: SimpleCertificateBucket =
        vec![intermediate.clone(), root.clone(), intermediate.clone()]
            .into_iter()
            .collect();
    assert_eq!(bucket.len(), 3);
    assert_eq!(bucket.find_by_subject(intermediate.subject()), Some(&intermediate));
    assert_eq!(bucket.find_by_subject(root.subject()), Some(&root));
}

#[test]
fn empty_bucket_finds_nothing() {
    let bucket = SimpleCertificateBucket::default();
    assert!(bucket.is_empty());
    assert!(bucket.find_by_subject(load("root.pem").subject()).is_none());
}

#[test]
fn buckets_are_shareable_across_threads() {
    let bucket: std::sync::Arc<dyn CertificateBucket> = std::sync::Arc::new(keystore());
    let leaf = load("ap-company.pem");
    std::thread::scope(|s| {
        for _ in 0..4 {
            let bucket = &bucket;
            let leaf = &leaf;
            s.spawn(move || assert!(bucket.find_by_subject(leaf.issuer()).is_some()));
        }
    });
}
