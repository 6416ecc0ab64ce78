//! Certificate decoding from PEM and DER formats.

use crate::certificate::Certificate;
use crate::fields::{AiaEntry, DateTime, DistinguishedName, Extension, NameComponent};
use crate::oid;
use crate::util;
use crate::CertError;
use x509_parser::der_parser::asn1_rs::Tag;
use x509_parser::prelude::*;

/// Parse a certificate from PEM or DER (auto-detected).
///
/// If the input begins with `-----BEGIN` (after stripping whitespace), it is
/// treated as PEM. Otherwise it is treated as DER.
pub fn parse_cert(input: &[u8]) -> Result<Certificate, CertError> {
    if input.is_empty() {
        return Err(CertError::Parse("empty input".into()));
    }

    if util::is_pem(input) {
        parse_pem(input)
    } else {
        parse_der(input)
    }
}

/// Parse a certificate from PEM format.
pub fn parse_pem(input: &[u8]) -> Result<Certificate, CertError> {
    let (_, pem) = x509_parser::pem::parse_x509_pem(input)
        .map_err(|e| CertError::Pem(format!("{}", e)))?;

    if pem.label != "CERTIFICATE"
        && pem.label != "TRUSTED CERTIFICATE"
        && pem.label != "X509 CERTIFICATE"
    {
        return Err(CertError::Pem(format!(
            "expected CERTIFICATE, got {}",
            pem.label
        )));
    }

    parse_der(&pem.contents)
}

/// Parse a certificate from DER format.
pub fn parse_der(input: &[u8]) -> Result<Certificate, CertError> {
    let (remaining, x509) =
        X509Certificate::from_der(input).map_err(|e| CertError::Der(format!("{}", e)))?;

    // Keep only the certificate bytes, not any trailing data.
    let cert_len = input.len() - remaining.len();
    let cert_der = input.get(..cert_len).unwrap_or(input);
    build_certificate(&x509, cert_der)
}

/// Parse a PEM-encoded buffer containing one or more certificates into
/// individual DER-encoded certificates.
pub fn parse_pem_chain(input: &[u8]) -> Result<Vec<Vec<u8>>, CertError> {
    let mut certs = Vec::new();

    for pem_result in Pem::iter_from_buffer(input) {
        match pem_result {
            Ok(pem) => {
                if pem.label == "CERTIFICATE" || pem.label == "TRUSTED CERTIFICATE" {
                    certs.push(pem.contents);
                }
            }
            Err(e) => {
                // Trailing garbage after at least one certificate is tolerated.
                if !certs.is_empty() {
                    break;
                }
                return Err(CertError::Pem(format!("failed to parse PEM: {}", e)));
            }
        }
    }

    if certs.is_empty() {
        return Err(CertError::Pem("no certificates found in PEM input".into()));
    }

    Ok(certs)
}

/// Build a [`Certificate`] from a parsed `X509Certificate`.
fn build_certificate(x509: &X509Certificate, raw_der: &[u8]) -> Result<Certificate, CertError> {
    let tbs = &x509.tbs_certificate;

    if tbs.version.0 > 2 {
        return Err(CertError::Parse(format!(
            "unsupported X.509 version {} (expected v1, v2, or v3)",
            tbs.version.0 + 1
        )));
    }

    let extensions: Vec<Extension> = tbs
        .extensions()
        .iter()
        .map(|ext| Extension {
            oid: ext.oid.to_id_string(),
            critical: ext.critical,
            value: ext.value.to_vec(),
        })
        .collect();

    Ok(Certificate {
        der: raw_der.to_vec(),
        serial: format_serial(tbs.raw_serial()),
        subject: build_dn(&tbs.subject),
        issuer: build_dn(&tbs.issuer),
        not_before: build_datetime(&tbs.validity.not_before),
        not_after: build_datetime(&tbs.validity.not_after),
        aia: build_aia(tbs.extensions()),
        extensions,
    })
}

/// Format a serial number as a colon-separated uppercase hex string,
/// stripping leading zero bytes but keeping at least one byte.
fn format_serial(raw: &[u8]) -> String {
    let stripped = match raw.iter().position(|&b| b != 0) {
        Some(pos) => raw.get(pos..).unwrap_or(raw),
        None => raw.get(raw.len().saturating_sub(1)..).unwrap_or(raw),
    };
    util::hex_colon_upper(stripped)
}

pub(crate) fn build_dn(name: &X509Name) -> DistinguishedName {
    let rdns: Vec<Vec<NameComponent>> = name
        .iter()
        .map(|rdn| {
            rdn.iter()
                .map(|attr| {
                    let key = util::oid_short_name(&attr.attr_type().to_id_string());
                    let value = attr.attr_value();
                    match decode_directory_string(value.tag(), value.data) {
                        Some(text) => NameComponent {
                            key,
                            value: text,
                            binary: false,
                        },
                        None => NameComponent {
                            key,
                            value: hex::encode(value.data),
                            binary: true,
                        },
                    }
                })
                .collect()
        })
        .collect();
    DistinguishedName::from_rdns(rdns, name.as_raw().to_vec())
}

/// Decode an attribute value of one of the ASN.1 string types.
///
/// TeletexString is read as Latin-1 (as OpenSSL does), BMPString as
/// UTF-16BE and UniversalString as UTF-32BE. Returns `None` for non-string
/// values and for malformed encodings.
fn decode_directory_string(tag: Tag, data: &[u8]) -> Option<String> {
    match tag {
        Tag::Utf8String
        | Tag::PrintableString
        | Tag::NumericString
        | Tag::Ia5String
        | Tag::VisibleString => std::str::from_utf8(data).ok().map(str::to_string),
        Tag::T61String => Some(data.iter().map(|&b| char::from(b)).collect()),
        Tag::BmpString => {
            let units = data.chunks_exact(2);
            if !units.remainder().is_empty() {
                return None;
            }
            let units = units.map(|u| <[u8; 2]>::try_from(u).map(u16::from_be_bytes));
            char::decode_utf16(units.collect::<Result<Vec<_>, _>>().ok()?)
                .collect::<Result<String, _>>()
                .ok()
        }
        Tag::UniversalString => {
            let units = data.chunks_exact(4);
            if !units.remainder().is_empty() {
                return None;
            }
            units
                .map(|u| {
                    <[u8; 4]>::try_from(u)
                        .ok()
                        .and_then(|b| char::from_u32(u32::from_be_bytes(b)))
                })
                .collect()
        }
        _ => None,
    }
}

fn build_datetime(asn1_time: &ASN1Time) -> DateTime {
    let ts = asn1_time.timestamp();
    let iso = match ::time::OffsetDateTime::from_unix_timestamp(ts) {
        Ok(dt) => format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            dt.year(),
            u8::from(dt.month()),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second()
        ),
        Err(_) => format!("{}", ts),
    };
    DateTime {
        iso8601: iso,
        timestamp: ts,
    }
}

fn build_aia(extensions: &[X509Extension]) -> Vec<AiaEntry> {
    extensions
        .iter()
        .find_map(|ext| match ext.parsed_extension() {
            ParsedExtension::AuthorityInfoAccess(aia) => Some(
                aia.accessdescs
                    .iter()
                    .map(|desc| {
                        let method = match desc.access_method.to_id_string().as_str() {
                            oid::ACCESS_OCSP => "OCSP".into(),
                            oid::ACCESS_CA_ISSUERS => "CA Issuers".into(),
                            other => other.to_string(),
                        };
                        AiaEntry {
                            method,
                            location: format_general_name(&desc.access_location),
                        }
                    })
                    .collect(),
            ),
            _ => None,
        })
        .unwrap_or_default()
}

fn format_general_name(gn: &GeneralName) -> String {
    match gn {
        GeneralName::URI(uri) => uri.to_string(),
        GeneralName::DNSName(name) => name.to_string(),
        GeneralName::RFC822Name(email) => email.to_string(),
        GeneralName::DirectoryName(dn) => build_dn(dn).to_rfc4514(),
        other => format!("{:?}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teletex_is_latin1() {
        assert_eq!(
            decode_directory_string(Tag::T61String, b"Bod\xf8").as_deref(),
            Some("Bodø")
        );
    }

    #[test]
    fn bmp_is_utf16_big_endian() {
        let data = [0x00, 0x42, 0x00, 0xf8, 0xd8, 0x3d, 0xde, 0x00];
        assert_eq!(
            decode_directory_string(Tag::BmpString, &data).as_deref(),
            Some("Bø\u{1F600}")
        );
        assert_eq!(decode_directory_string(Tag::BmpString, &[0x00]), None);
    }

    #[test]
    fn universal_is_utf32_big_endian() {
        let data = [0, 0, 0, 0x55, 0, 0, 0, 0xdc];
        assert_eq!(
            decode_directory_string(Tag::UniversalString, &data).as_deref(),
            Some("UÜ")
        );
        assert_eq!(decode_directory_string(Tag::UniversalString, &[0, 0x11, 0, 0]), None);
    }

    #[test]
    fn non_string_values_are_not_decoded() {
        assert_eq!(decode_directory_string(Tag::OctetString, b"abc"), None);
        assert_eq!(decode_directory_string(Tag::Utf8String, &[0xff]), None);
    }
}
