use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Display;

/// Distinguished-name fields keyed by short name (`CN`, `O`, `C`, ...).
pub type DistinguishedName = BTreeMap<String, String>;

/// Incoming boundary request from the shell.
#[derive(Debug, Default, Deserialize)]
pub struct InspectRequest {
    /// Anything that is not a JSON string is treated as missing.
    #[serde(default, deserialize_with = "lenient_string")]
    pub url: String,
}

impl InspectRequest {
    /// Parses a JSON body, treating an unreadable body as an empty request.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

/// Snapshot of the certificate a server presented during one handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateInfo {
    pub subject: DistinguishedName,
    pub issuer: DistinguishedName,
    /// Unix timestamp (seconds) of notBefore
    pub valid_from: i64,
    /// Unix timestamp (seconds) of notAfter
    pub valid_to: i64,
    /// Lower-case hex digest of the leaf DER
    pub fingerprint: String,
    /// Digest used for `fingerprint` (`sha1` or `sha256`)
    pub fingerprint_algorithm: String,
    pub raw: RawCertificate,
}

/// Full certificate structure as seen by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCertificate {
    /// Base64 of the leaf DER
    pub der: String,
    pub serial_number: String,
    pub version: u32,
    pub signature_algorithm: String,
    pub subject_alt_names: Vec<String>,
    pub protocol: String,
    pub cipher: String,
    /// Every certificate the peer sent, leaf first
    pub chain: Vec<ChainCertificate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainCertificate {
    pub subject: String,
    pub issuer: String,
    pub fingerprint: String,
    pub der: String,
}

/// `get-certificate` success payload, serialized as `{ok: true, cert: {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificatePayload {
    pub cert: CertificateInfo,
}

/// Title and favicon scraped from a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: String,
    /// Absolute URL, or empty when the page declares no icon
    pub favicon: String,
}

/// Result envelope returned by every boundary operation.
///
/// Serializes as `{ok: true, ...value}` or `{ok: false, error: "..."}`; the
/// value's fields sit next to `ok`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope<T> {
    Ok(T),
    Err(String),
}

impl<T> Envelope<T> {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Err(message.into())
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Ok(value) => Some(value),
            Self::Err(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Ok(_) => None,
            Self::Err(message) => Some(message),
        }
    }
}

impl<T, E: Display> From<Result<T, E>> for Envelope<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(e) => Self::Err(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct WireEnvelope<'a, T> {
    ok: bool,
    #[serde(flatten)]
    value: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl<T: Serialize> Serialize for Envelope<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireEnvelope {
            ok: self.is_ok(),
            value: self.value(),
            error: self.error_message(),
        }
        .serialize(serializer)
    }
}
