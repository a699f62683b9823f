//! X.509 certificate parsing utilities.
//!
//! Turns the DER chain captured from a TLS connection into a
//! [`CertificateInfo`].

use crate::config::FingerprintAlgorithm;
use crate::error::FetchError;
use crate::inspect::types::{
    CertificateInfo, ChainCertificate, DistinguishedName, RawCertificate,
};
use base64::Engine;
use ring::digest;
use std::net::{Ipv4Addr, Ipv6Addr};
use x509_parser::objects::{oid2abbrev, oid2sn, oid_registry};
use x509_parser::prelude::*;

/// Fields parsed from a single DER-encoded certificate.
#[derive(Debug, Default)]
pub struct BasicCertInfo {
    pub subject: DistinguishedName,
    pub issuer: DistinguishedName,
    pub valid_from: i64,
    pub valid_to: i64,
    pub serial_number: String,
    pub version: u32,
    pub signature_algorithm: String,
    pub san: Vec<String>,
}

/// Parses the fields shown in the certificate panel.
///
/// # Arguments
///
/// * `der` - The DER-encoded certificate data
///
/// # Returns
///
/// A `BasicCertInfo` with names, validity, serial and SANs, or a parse error
/// if the bytes are not a valid X.509 certificate.
pub fn parse_x509_basic(der: &[u8]) -> Result<BasicCertInfo, FetchError> {
    let (_, cert) = X509Certificate::from_der(der)
        .map_err(|e| FetchError::Parse(format!("invalid certificate: {}", e)))?;

    let signature_algorithm = oid2sn(&cert.signature_algorithm.algorithm, oid_registry())
        .map(str::to_string)
        .unwrap_or_else(|_| cert.signature_algorithm.algorithm.to_id_string());

    Ok(BasicCertInfo {
        subject: name_fields(cert.subject()),
        issuer: name_fields(cert.issuer()),
        valid_from: cert.validity().not_before.timestamp(),
        valid_to: cert.validity().not_after.timestamp(),
        serial_number: cert.raw_serial_as_string(),
        version: cert.version().0 + 1,
        signature_algorithm,
        san: subject_alt_names(&cert),
    })
}

/// Maps each RDN attribute to its short name. Repeated attributes (several
/// `OU`s, say) are joined with ", ".
pub fn name_fields(name: &X509Name<'_>) -> DistinguishedName {
    let mut fields = DistinguishedName::new();
    for attr in name.iter_attributes() {
        let key = oid2abbrev(attr.attr_type(), oid_registry())
            .map(str::to_string)
            .unwrap_or_else(|_| attr.attr_type().to_id_string());
        let value = attr
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|_| String::from_utf8_lossy(attr.attr_value().data).into_owned());

        fields
            .entry(key)
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    fields
}

fn subject_alt_names(cert: &X509Certificate<'_>) -> Vec<String> {
    let mut names = Vec::new();
    if let Ok(Some(san_ext)) = cert.subject_alternative_name() {
        for name in &san_ext.value.general_names {
            match name {
                GeneralName::DNSName(dns) => names.push(dns.to_string()),
                GeneralName::IPAddress(ip) => {
                    if let Ok(octets) = <[u8; 4]>::try_from(*ip) {
                        names.push(Ipv4Addr::from(octets).to_string());
                    } else if let Ok(octets) = <[u8; 16]>::try_from(*ip) {
                        names.push(Ipv6Addr::from(octets).to_string());
                    }
                }
                GeneralName::RFC822Name(email) => names.push(format!("email:{}", email)),
                GeneralName::URI(uri) => names.push(format!("uri:{}", uri)),
                _ => {}
            }
        }
    }
    names
}

/// Lower-case hex digest of `der`.
pub fn fingerprint(der: &[u8], algorithm: FingerprintAlgorithm) -> String {
    let algorithm = match algorithm {
        FingerprintAlgorithm::Sha1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
        FingerprintAlgorithm::Sha256 => &digest::SHA256,
    };
    digest::digest(algorithm, der)
        .as_ref()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn encode_der(der: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(der)
}

fn chain_entry(der: &[u8], algorithm: FingerprintAlgorithm) -> ChainCertificate {
    let (subject, issuer) = match X509Certificate::from_der(der) {
        Ok((_, cert)) => (cert.subject().to_string(), cert.issuer().to_string()),
        Err(_) => (String::new(), String::new()),
    };
    ChainCertificate {
        subject,
        issuer,
        fingerprint: fingerprint(der, algorithm),
        der: encode_der(der),
    }
}

/// Builds a [`CertificateInfo`] from the chain a peer presented.
///
/// # Arguments
///
/// * `chain` - DER certificates, leaf first
/// * `protocol` - Negotiated protocol label, e.g. `TLS 1.3`
/// * `cipher` - Negotiated cipher suite name
/// * `algorithm` - Digest used for every fingerprint in the result
///
/// # Returns
///
/// The leaf's summary with the whole chain under `raw`, or
/// `FetchError::NoCertificate` for an empty chain.
pub fn certificate_info_from_chain<C: AsRef<[u8]>>(
    chain: &[C],
    protocol: String,
    cipher: String,
    algorithm: FingerprintAlgorithm,
) -> Result<CertificateInfo, FetchError> {
    let leaf = chain.first().ok_or(FetchError::NoCertificate)?.as_ref();
    if leaf.is_empty() {
        return Err(FetchError::NoCertificate);
    }

    let basic = parse_x509_basic(leaf)?;

    Ok(CertificateInfo {
        subject: basic.subject,
        issuer: basic.issuer,
        valid_from: basic.valid_from,
        valid_to: basic.valid_to,
        fingerprint: fingerprint(leaf, algorithm),
        fingerprint_algorithm: algorithm.name().to_string(),
        raw: RawCertificate {
            der: encode_der(leaf),
            serial_number: basic.serial_number,
            version: basic.version,
            signature_algorithm: basic.signature_algorithm,
            subject_alt_names: basic.san,
            protocol,
            cipher,
            chain: chain
                .iter()
                .map(|der| chain_entry(der.as_ref(), algorithm))
                .collect(),
        },
    })
}

/// Extracts certificate info from an established TLS connection.
///
/// # Arguments
///
/// * `conn` - A reference to a TLS stream that completed its handshake
/// * `algorithm` - Digest used for fingerprints
///
/// # Returns
///
/// The certificate summary, or `FetchError::NoCertificate` if the peer sent no
/// certificates.
pub fn extract_cert_info<IO>(
    conn: &tokio_rustls::client::TlsStream<IO>,
    algorithm: FingerprintAlgorithm,
) -> Result<CertificateInfo, FetchError> {
    let (_, client_conn) = conn.get_ref();

    let protocol = match client_conn.protocol_version() {
        Some(rustls::ProtocolVersion::TLSv1_2) => "TLS 1.2".to_string(),
        Some(rustls::ProtocolVersion::TLSv1_3) => "TLS 1.3".to_string(),
        _ => "TLS".to_string(),
    };

    let cipher = client_conn
        .negotiated_cipher_suite()
        .map(|cs| format!("{:?}", cs.suite()))
        .unwrap_or_else(|| "Unknown".to_string());

    let certs = client_conn.peer_certificates().unwrap_or_default();
    certificate_info_from_chain(certs, protocol, cipher, algorithm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{CERT_DER, CERT_SHA1, CERT_SHA256};

    #[test]
    fn test_parse_invalid_der() {
        let err = parse_x509_basic(&[0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, FetchError::Parse(_)));
    }

    #[test]
    fn test_parse_test_certificate() {
        let info = parse_x509_basic(CERT_DER).unwrap();
        assert_eq!(info.subject.get("CN").map(String::as_str), Some("localhost"));
        assert_eq!(info.subject.get("O").map(String::as_str), Some("Page Inspector Tests"));
        assert_eq!(info.subject.get("C").map(String::as_str), Some("NL"));
        // Self-signed.
        assert_eq!(info.subject, info.issuer);
        assert!(info.valid_to > info.valid_from);
        assert_eq!(info.version, 3);
        assert!(info.san.contains(&"localhost".to_string()));
        assert!(info.san.contains(&"127.0.0.1".to_string()));
    }

    #[test]
    fn test_fingerprint_algorithms() {
        assert_eq!(fingerprint(CERT_DER, FingerprintAlgorithm::Sha256), CERT_SHA256);

        let sha1 = fingerprint(CERT_DER, FingerprintAlgorithm::Sha1);
        assert_eq!(sha1, CERT_SHA1);
        assert!(sha1.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_empty_chain_is_no_certificate() {
        let empty: [&[u8]; 0] = [];
        let err = certificate_info_from_chain(
            &empty,
            "TLS 1.3".into(),
            "Unknown".into(),
            FingerprintAlgorithm::Sha256,
        )
        .unwrap_err();
        assert_eq!(err, FetchError::NoCertificate);
    }

    #[test]
    fn test_info_from_chain() {
        let info = certificate_info_from_chain(
            &[CERT_DER],
            "TLS 1.3".into(),
            "TLS13_AES_128_GCM_SHA256".into(),
            FingerprintAlgorithm::Sha256,
        )
        .unwrap();
        assert_eq!(info.fingerprint, CERT_SHA256);
        assert_eq!(info.fingerprint_algorithm, "sha256");
        assert_eq!(info.raw.chain.len(), 1);
        assert_eq!(info.raw.chain[0].fingerprint, CERT_SHA256);
        assert!(info.raw.chain[0].subject.contains("CN=localhost"));
        assert_eq!(info.raw.protocol, "TLS 1.3");
    }
}
