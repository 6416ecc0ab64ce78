//! Shared encoding utilities.

use crate::oid;

/// Format bytes as colon-separated uppercase hex (e.g., "AB:CD:EF").
pub fn hex_colon_upper(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Whether the input looks like PEM (begins with `-----BEGIN` after leading
/// whitespace).
pub fn is_pem(input: &[u8]) -> bool {
    let start = input
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(input.len());
    input
        .get(start..)
        .is_some_and(|rest| rest.starts_with(b"-----BEGIN"))
}

/// Map a DN attribute OID to the short name used in rendered DN strings.
///
/// Unknown attributes keep their dotted-decimal OID, which is also how
/// RFC 4514 renders them.
pub fn oid_short_name(oid_str: &str) -> String {
    match oid_str {
        oid::COMMON_NAME => "CN".into(),
        oid::SURNAME => "SN".into(),
        oid::SERIAL_NUMBER => "SERIALNUMBER".into(),
        oid::COUNTRY => "C".into(),
        oid::LOCALITY => "L".into(),
        oid::STATE_OR_PROVINCE => "ST".into(),
        oid::STREET_ADDRESS => "STREET".into(),
        oid::ORGANIZATION => "O".into(),
        oid::ORGANIZATIONAL_UNIT => "OU".into(),
        oid::TITLE => "T".into(),
        oid::POSTAL_CODE => "postalCode".into(),
        oid::GIVEN_NAME => "GIVENNAME".into(),
        oid::ORGANIZATION_IDENTIFIER => "organizationIdentifier".into(),
        oid::EMAIL_ADDRESS => "EMAILADDRESS".into(),
        oid::DOMAIN_COMPONENT => "DC".into(),
        oid::USER_ID => "UID".into(),
        other => other.to_string(),
    }
}
