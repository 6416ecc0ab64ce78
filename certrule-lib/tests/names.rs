#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Name matching across directory string encodings.
//!
//! `enc-ca.pem` encodes its subject as PrintableString while both leaves
//! carry the issuer as UTF8String. `enc-t61.pem` has a T61String `O`,
//! `enc-bmp.pem` a BMPString `O` and a UniversalString `CN`.

mod common;

use certrule_lib::{
    dn, CertificateBucket, ChainRule, OcspRequest, OcspRule, OrganizationNumberRule,
    PrincipalNameRule, ResponderError, RevocationResponder, RevocationStatus,
    SimpleCertificateBucket, SimplePrincipalNameProvider, ValidatorRule,
};
use common::{certs_dir, load};
use std::sync::Arc;

const ORG: &str = "Bodø Firma AS - 974760673";

fn encoding_ca() -> Arc<dyn CertificateBucket> {
    Arc::new(SimpleCertificateBucket::new(vec![load("enc-ca.pem")]))
}

struct AlwaysGood;

impl RevocationResponder for AlwaysGood {
    fn check(&self, request: &OcspRequest<'_>) -> Result<RevocationStatus, ResponderError> {
        assert_eq!(request.issuer.serial(), "05:00");
        Ok(RevocationStatus::good())
    }
}

#[test]
fn issuer_matches_subject_across_string_types() {
    let ca = load("enc-ca.pem");
    let leaf = load("enc-t61.pem");
    assert_ne!(ca.subject().raw, leaf.issuer().raw);
    assert_eq!(ca.subject(), leaf.issuer());
    let bucket = encoding_ca();
    let found = bucket.find_by_subject(leaf.issuer()).unwrap();
    assert_eq!(found.serial(), "05:00");
}

#[test]
fn ocsp_finds_issuer_encoded_differently() {
    let rule = OcspRule::new(encoding_ca(), Arc::new(AlwaysGood));
    rule.validate(&load("enc-t61.pem")).unwrap();
}

#[test]
fn chain_links_issuer_encoded_differently() {
    let rule = ChainRule::new(encoding_ca(), Arc::new(SimpleCertificateBucket::default()));
    for name in ["enc-t61.pem", "enc-bmp.pem"] {
        let leaf = load(name);
        rule.validate(&leaf).unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(rule.find_path(&leaf).unwrap().len(), 2);
    }
}

#[test]
fn teletex_organization_is_latin1() {
    let leaf = load("enc-t61.pem");
    assert!(
        leaf.subject().to_rfc4514().contains(&format!("O={ORG}")),
        "{}",
        leaf.subject()
    );
    PrincipalNameRule::attribute("O", SimplePrincipalNameProvider::new([ORG]))
        .validate(&leaf)
        .unwrap();
}

#[test]
fn bmp_and_universal_strings_are_text() {
    let leaf = load("enc-bmp.pem");
    PrincipalNameRule::attribute("O", SimplePrincipalNameProvider::new([ORG]))
        .validate(&leaf)
        .unwrap();
    PrincipalNameRule::attribute("CN", SimplePrincipalNameProvider::new(["Üniversal Leaf"]))
        .validate(&leaf)
        .unwrap();
    assert!(!leaf.subject().to_rfc4514().contains('#'));
}

#[test]
fn org_number_read_from_non_utf8_strings() {
    let rule = OrganizationNumberRule::new(SimplePrincipalNameProvider::new(["974760673"]));
    for name in ["enc-t61.pem", "enc-bmp.pem"] {
        rule.validate(&load(name)).unwrap_or_else(|e| panic!("{name}: {e}"));
    }
}

#[test]
fn rendered_names_parse_back() {
    for entry in std::fs::read_dir(certs_dir()).unwrap() {
        let path = entry.unwrap().path();
        if path.extension().and_then(|e| e.to_str()) != Some("pem") {
            continue;
        }
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if name == "bundle.pem" {
            continue;
        }
        let cert = load(&name);
        for rendered in [cert.subject().to_rfc4514(), cert.issuer().to_rfc4514()] {
            assert!(dn::parse(&rendered).is_ok(), "{name}: {rendered}");
        }
    }
    let rendered = load("enc-t61.pem").subject().to_rfc4514();
    assert_eq!(dn::extract(&rendered, "O").unwrap(), vec![ORG.to_string()]);
}
