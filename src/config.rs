use std::env;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

/// Default timeout for both fetchers.
pub const DEFAULT_TIMEOUT_MS: u64 = 9000;

/// Markup beyond this many characters is dropped before scraping.
pub const DEFAULT_MAX_BODY_CHARS: usize = 200_000;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Electron) MetadataFetcher/1.0";

pub const DEFAULT_MAX_REDIRECTS: usize = 10;

pub struct Config {
    pub port: u16,
    pub bind_addr: IpAddr,
    pub fetch: FetchConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            bind_addr: env::var("BIND_ADDR")
                .ok()
                .and_then(|a| a.parse().ok())
                .unwrap_or(IpAddr::from([127, 0, 0, 1])),
            fetch: FetchConfig::from_env(),
        }
    }
}

/// How the certificate fetcher treats the chain the server presents.
///
/// The certificate panel exists to show whatever the server sends, including
/// expired and self-signed certificates, so `AcceptAny` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CertVerification {
    /// Complete the handshake regardless of chain validity.
    #[default]
    AcceptAny,
    /// Require a chain that validates against the Mozilla root store.
    WebPki,
}

impl FromStr for CertVerification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept-any" | "any" | "none" => Ok(Self::AcceptAny),
            "webpki" | "strict" => Ok(Self::WebPki),
            other => Err(format!("Unknown certificate verification mode: {}", other)),
        }
    }
}

/// Digest used for certificate fingerprints. SHA-1 is what certificate viewers
/// conventionally show; the chosen algorithm is reported alongside every
/// fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FingerprintAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl FingerprintAlgorithm {
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
        }
    }
}

impl FromStr for FingerprintAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            other => Err(format!("Unknown fingerprint algorithm: {}", other)),
        }
    }
}

/// Settings shared by the certificate and metadata fetchers.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub max_body_chars: usize,
    pub user_agent: String,
    pub max_redirects: usize,
    pub cert_verification: CertVerification,
    pub fingerprint_algorithm: FingerprintAlgorithm,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_body_chars: DEFAULT_MAX_BODY_CHARS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            cert_verification: CertVerification::default(),
            fingerprint_algorithm: FingerprintAlgorithm::default(),
        }
    }
}

impl FetchConfig {
    /// Reads overrides from the environment. Unparseable values keep the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout: env_parsed::<u64>("FETCH_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.timeout),
            max_body_chars: env_parsed("METADATA_MAX_CHARS").unwrap_or(defaults.max_body_chars),
            user_agent: env::var("METADATA_USER_AGENT")
                .ok()
                .filter(|ua| !ua.trim().is_empty())
                .unwrap_or(defaults.user_agent),
            max_redirects: env_parsed("METADATA_MAX_REDIRECTS").unwrap_or(defaults.max_redirects),
            cert_verification: env_parsed("CERT_VERIFICATION")
                .unwrap_or(defaults.cert_verification),
            fingerprint_algorithm: env_parsed("CERT_FINGERPRINT")
                .unwrap_or(defaults.fingerprint_algorithm),
        }
    }
}

fn env_parsed<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
