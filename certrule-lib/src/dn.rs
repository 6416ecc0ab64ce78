//! Distinguished-name string parsing.
//!
//! Rules look at names through their RFC 4514 rendering (see
//! [`DistinguishedName::to_rfc4514`](crate::DistinguishedName::to_rfc4514)),
//! which makes the extraction logic independent of the certificate decoder
//! and lets it be exercised on plain strings.
//!
//! Both `,` and `;` separate RDNs and `+` joins multi-valued RDNs; all three
//! are treated as plain attribute separators here. Values may be quoted,
//! backslash-escaped (`\,` or hex pairs such as `\C3\A5`), or hex-encoded
//! binary (`#0403...`, returned verbatim including the `#`).

use crate::util;

/// Errors from parsing a distinguished-name string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DnError {
    #[error("missing '=' after attribute type at offset {0}")]
    MissingEquals(usize),

    #[error("empty attribute type at offset {0}")]
    EmptyKey(usize),

    #[error("unexpected character {ch:?} at offset {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("dangling escape at end of value")]
    DanglingEscape,

    #[error("unterminated quoted value starting at offset {0}")]
    UnterminatedQuote(usize),

    #[error("attribute value is not valid UTF-8")]
    InvalidUtf8,
}

/// Parse a DN string into ordered `(type, value)` pairs.
///
/// An empty (or all-whitespace) string yields no attributes.
pub fn parse(dn: &str) -> Result<Vec<(String, String)>, DnError> {
    let mut parser = Parser {
        bytes: dn.as_bytes(),
        pos: 0,
    };
    let mut attributes = Vec::new();

    parser.skip_spaces();
    if parser.at_end() {
        return Ok(attributes);
    }

    loop {
        let key = parser.key()?;
        let value = parser.value()?;
        attributes.push((key, value));

        parser.skip_spaces();
        match parser.bump() {
            None => break,
            Some(b',' | b';' | b'+') => parser.skip_spaces(),
            Some(other) => {
                return Err(DnError::UnexpectedChar {
                    ch: other as char,
                    pos: parser.pos - 1,
                })
            }
        }
    }

    Ok(attributes)
}

/// Extract every value of attribute `key` from `dn`, in order of appearance.
///
/// Keys compare case-insensitively, and a dotted OID matches its short name
/// (`2.5.4.5` matches `SERIALNUMBER`). Duplicate values are kept.
pub fn extract(dn: &str, key: &str) -> Result<Vec<String>, DnError> {
    let wanted = canonical_key(key);
    Ok(parse(dn)?
        .into_iter()
        .filter(|(k, _)| canonical_key(k).eq_ignore_ascii_case(&wanted))
        .map(|(_, v)| v)
        .collect())
}

fn canonical_key(key: &str) -> String {
    if key.starts_with(|c: char| c.is_ascii_digit()) {
        util::oid_short_name(key)
    } else {
        key.to_string()
    }
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_spaces(&mut self) {
        while self.peek() == Some(b' ') {
            self.pos += 1;
        }
    }

    fn key(&mut self) -> Result<String, DnError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if matches!(b, b'=' | b',' | b';' | b'+') {
                break;
            }
            self.pos += 1;
        }
        if self.peek() != Some(b'=') {
            return Err(DnError::MissingEquals(self.pos));
        }
        let key = self
            .bytes
            .get(start..self.pos)
            .map(|k| String::from_utf8_lossy(k).trim().to_string())
            .unwrap_or_default();
        if key.is_empty() {
            return Err(DnError::EmptyKey(start));
        }
        self.pos += 1; // '='
        Ok(key)
    }

    fn value(&mut self) -> Result<String, DnError> {
        self.skip_spaces();
        match self.peek() {
            Some(b'"') => self.quoted_value(),
            Some(b'#') => Ok(self.hex_value()),
            _ => self.plain_value(),
        }
    }

    fn hex_value(&mut self) -> String {
        let start = self.pos;
        self.pos += 1; // '#'
        while self.peek().is_some_and(|b| b.is_ascii_hexdigit()) {
            self.pos += 1;
        }
        self.bytes
            .get(start..self.pos)
            .map(|v| String::from_utf8_lossy(v).into_owned())
            .unwrap_or_default()
    }

    fn quoted_value(&mut self) -> Result<String, DnError> {
        let start = self.pos;
        self.pos += 1; // opening quote
        let mut out = Vec::new();
        loop {
            match self.bump() {
                None => return Err(DnError::UnterminatedQuote(start)),
                Some(b'"') => break,
                Some(b'\\') => out.push(self.escaped()?),
                Some(b) => out.push(b),
            }
        }
        String::from_utf8(out).map_err(|_| DnError::InvalidUtf8)
    }

    fn plain_value(&mut self) -> Result<String, DnError> {
        let mut out = Vec::new();
        // Length of `out` up to the last byte that must be kept; unescaped
        // trailing spaces are dropped.
        let mut significant = 0;
        while let Some(b) = self.peek() {
            if matches!(b, b',' | b';' | b'+') {
                break;
            }
            self.pos += 1;
            if b == b'\\' {
                out.push(self.escaped()?);
                significant = out.len();
            } else {
                out.push(b);
                if b != b' ' {
                    significant = out.len();
                }
            }
        }
        out.truncate(significant);
        String::from_utf8(out).map_err(|_| DnError::InvalidUtf8)
    }

    /// Decode the character after a backslash: either a hex pair or a
    /// literal character.
    fn escaped(&mut self) -> Result<u8, DnError> {
        let first = self.bump().ok_or(DnError::DanglingEscape)?;
        if let Some(second) = self.peek() {
            if first.is_ascii_hexdigit() && second.is_ascii_hexdigit() {
                self.pos += 1;
                let pair = [first, second];
                let text = std::str::from_utf8(&pair).map_err(|_| DnError::InvalidUtf8)?;
                return u8::from_str_radix(text, 16).map_err(|_| DnError::InvalidUtf8);
            }
        }
        Ok(first)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_attribute() {
        let dn = "C=NO,O=RF Commfides,SERIALNUMBER=399573952,CN=RF Commfides";
        assert_eq!(extract(dn, "C").unwrap(), vec!["NO"]);
        assert_eq!(extract(dn, "SERIALNUMBER").unwrap(), vec!["399573952"]);
    }

    #[test]
    fn extracts_every_occurrence_in_order() {
        let dn = "CN=Plain,OU=Sales,O=Nothing Here AS,OU=Support,OU=Sales";
        assert_eq!(
            extract(dn, "OU").unwrap(),
            vec!["Sales", "Support", "Sales"]
        );
    }

    #[test]
    fn key_matching_ignores_case_and_accepts_oids() {
        let dn = "cn=name, serialNumber=123";
        assert_eq!(extract(dn, "CN").unwrap(), vec!["name"]);
        assert_eq!(extract(dn, "2.5.4.5").unwrap(), vec!["123"]);
    }

    #[test]
    fn openssl_style_spacing_is_tolerated() {
        let dn = "CN=name, OU=None, O=organisasjon - 123456789, L=None, C=None";
        assert_eq!(
            extract(dn, "O").unwrap(),
            vec!["organisasjon - 123456789"]
        );
    }

    #[test]
    fn escaped_separator_stays_in_value() {
        let dn = "C=NO,L=FORNEBUVEIEN 1\\, 1366 LYSAKER,O=RF Commfides";
        assert_eq!(
            extract(dn, "L").unwrap(),
            vec!["FORNEBUVEIEN 1, 1366 LYSAKER"]
        );
    }

    #[test]
    fn hex_pair_escapes_decode_utf8() {
        assert_eq!(extract("L=Bod\\C3\\B8", "L").unwrap(), vec!["Bodø"]);
    }

    #[test]
    fn quoted_values_keep_separators() {
        assert_eq!(
            extract("O=\"Acme, Inc.\",C=US", "O").unwrap(),
            vec!["Acme, Inc."]
        );
    }

    #[test]
    fn escaped_trailing_space_is_kept() {
        assert_eq!(extract("CN=\\ padded\\ ", "CN").unwrap(), vec![" padded "]);
        assert_eq!(extract("CN=plain   ,C=NO", "CN").unwrap(), vec!["plain"]);
    }

    #[test]
    fn binary_values_are_returned_verbatim() {
        assert_eq!(extract("1.2.3.4=#0403ABCD", "1.2.3.4").unwrap(), vec!["#0403ABCD"]);
    }

    #[test]
    fn multi_valued_rdn_is_flattened() {
        let dn = "CN=a+UID=b,C=NO";
        assert_eq!(extract(dn, "UID").unwrap(), vec!["b"]);
    }

    #[test]
    fn empty_dn_has_no_attributes() {
        assert!(parse("").unwrap().is_empty());
        assert!(extract("   ", "CN").unwrap().is_empty());
    }

    #[test]
    fn missing_attribute_is_empty_not_error() {
        assert!(extract("C=NO", "O").unwrap().is_empty());
    }

    #[test]
    fn malformed_strings_are_rejected() {
        assert_eq!(parse("CN"), Err(DnError::MissingEquals(2)));
        assert_eq!(parse("=x"), Err(DnError::EmptyKey(0)));
        assert_eq!(parse("CN=x\\"), Err(DnError::DanglingEscape));
        assert_eq!(parse("O=\"open"), Err(DnError::UnterminatedQuote(2)));
        assert!(matches!(parse("C=NO,"), Err(DnError::MissingEquals(_))));
        assert_eq!(parse("CN=\\FF"), Err(DnError::InvalidUtf8));
    }
}
