#![no_main]

use certrule_lib::{
    dn, extract_organization_number, parse_cert, ExpirationRule, SigningRule, ValidatorRule,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding must never panic, regardless of input.
    if let Ok(cert) = parse_cert(data) {
        let _ = cert.subject().to_rfc4514();
        let _ = cert.issuer().to_string();
        let _ = cert.serial();
        let _ = cert.fingerprint();
        let _ = cert.ocsp_urls();
        let _ = cert.is_self_signed();

        // Rendered names must be accepted by the DN parser.
        let subject = cert.subject().to_rfc4514();
        assert!(dn::parse(&subject).is_ok(), "unparseable subject: {subject}");
        let issuer = cert.issuer().to_rfc4514();
        assert!(dn::parse(&issuer).is_ok(), "unparseable issuer: {issuer}");
        let _ = extract_organization_number(&subject);

        let _ = ExpirationRule::new().at_time(0).validate(&cert);
        let _ = SigningRule::PublicSignedOnly.validate(&cert);
    }
});
