//! Certificate data types: distinguished names, dates and extensions.

use serde::Serialize;

/// One attribute of a distinguished name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NameComponent {
    /// Attribute short name where known (e.g., "CN", "O", "C"), else the OID.
    pub key: String,
    /// Attribute value. For non-string values this is the hex encoding of the
    /// raw value bytes, without the leading `#`.
    pub value: String,
    /// Whether `value` is hex-encoded binary rather than text.
    pub binary: bool,
}

impl NameComponent {
    fn canonical(&self) -> String {
        let mut out = self.key.to_ascii_lowercase();
        out.push('=');
        if self.binary {
            out.push('#');
            out.push_str(&self.value.to_ascii_lowercase());
        } else {
            let folded = self
                .value
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            for ch in folded.chars() {
                if matches!(ch, ',' | '+' | '=' | '\\') {
                    out.push('\\');
                }
                out.push(ch);
            }
        }
        out
    }
}

/// Distinguished name with ordered components and its raw DER encoding.
///
/// Equality and hashing use a canonical form (RFC 5280 Section 7.1): values
/// compare as case-folded decoded text with whitespace runs collapsed,
/// whatever ASN.1 string type encoded them. Attributes within a
/// multi-valued RDN compare as a set.
#[derive(Debug, Clone, Serialize)]
pub struct DistinguishedName {
    /// Ordered list of attributes, in encoded order.
    pub components: Vec<NameComponent>,
    /// DER encoding of the `Name` structure.
    #[serde(skip)]
    pub raw: Vec<u8>,
    #[serde(skip)]
    canonical: String,
}

impl PartialEq for DistinguishedName {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for DistinguishedName {}

impl std::hash::Hash for DistinguishedName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl DistinguishedName {
    /// Build a name from its RDNs, each a set of one or more attributes.
    pub(crate) fn from_rdns(rdns: Vec<Vec<NameComponent>>, raw: Vec<u8>) -> Self {
        let canonical = rdns
            .iter()
            .map(|rdn| {
                let mut atvs: Vec<String> = rdn.iter().map(NameComponent::canonical).collect();
                atvs.sort_unstable();
                atvs.join("+")
            })
            .collect::<Vec<_>>()
            .join(",");
        DistinguishedName {
            components: rdns.into_iter().flatten().collect(),
            raw,
            canonical,
        }
    }

    /// The comparison key used for equality, hashing and bucket lookups.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// Format as an RFC 4514 string, e.g. `C=NO,O=Org,CN=Name`.
    ///
    /// Components are written in encoded order. Special characters are
    /// backslash-escaped and binary values are written as `#` followed by hex.
    pub fn to_rfc4514(&self) -> String {
        let mut result = String::new();
        for (i, c) in self.components.iter().enumerate() {
            if i > 0 {
                result.push(',');
            }
            result.push_str(&c.key);
            result.push('=');
            if c.binary {
                result.push('#');
                result.push_str(&c.value);
            } else {
                escape_value(&c.value, &mut result);
            }
        }
        result
    }
}

fn escape_value(value: &str, out: &mut String) {
    let last = value.chars().count().saturating_sub(1);
    for (i, ch) in value.chars().enumerate() {
        match ch {
            '"' | '+' | ',' | ';' | '<' | '>' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '#' | ' ' if i == 0 => {
                out.push('\\');
                out.push(ch);
            }
            ' ' if i == last => out.push_str("\\ "),
            _ => out.push(ch),
        }
    }
}

impl std::fmt::Display for DistinguishedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_rfc4514())
    }
}

/// Date-time representation.
#[derive(Debug, Clone, Serialize)]
pub struct DateTime {
    /// ISO 8601 formatted string.
    pub iso8601: String,
    /// Unix timestamp.
    pub timestamp: i64,
}

impl std::fmt::Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.iso8601)
    }
}

/// A certificate extension as encoded in the certificate.
#[derive(Debug, Clone, Serialize)]
pub struct Extension {
    /// OID as a dotted-decimal string.
    pub oid: String,
    /// Whether this extension is marked critical.
    pub critical: bool,
    /// Raw `extnValue` contents.
    #[serde(skip)]
    pub value: Vec<u8>,
}

/// Authority Information Access entry.
#[derive(Debug, Clone, Serialize)]
pub struct AiaEntry {
    /// Access method: "OCSP", "CA Issuers", or the method OID.
    pub method: String,
    /// Access location (usually a URI).
    pub location: String,
}
