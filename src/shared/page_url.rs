//! Page URL handling shared by both fetchers.

use crate::error::FetchError;
use rustls_pki_types::ServerName;
use std::net::IpAddr;
use url::{Host, Url};

/// Port used by the certificate fetcher when the URL does not name one.
pub const DEFAULT_TLS_PORT: u16 = 443;

/// A parsed, absolute page URL with a host.
#[derive(Debug, Clone)]
pub struct PageTarget {
    url: Url,
    host: Host<String>,
}

impl PageTarget {
    /// Parses the URL handed over by the shell.
    ///
    /// Empty, relative, unparseable and host-less URLs are all rejected with
    /// [`FetchError::NoUrl`].
    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(FetchError::NoUrl);
        }

        let url = Url::parse(raw).map_err(|e| {
            tracing::debug!(url = %raw, error = %e, "Rejecting unparseable URL");
            FetchError::NoUrl
        })?;

        let host = match url.host() {
            Some(host) => host.to_owned(),
            None => return Err(FetchError::NoUrl),
        };
        if matches!(&host, Host::Domain(d) if d.is_empty()) {
            return Err(FetchError::NoUrl);
        }

        Ok(Self { url, host })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Host as it appears in the URL (IPv6 literals keep their brackets).
    pub fn hostname(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// Host in the form accepted by resolvers and sockets.
    pub fn dial_host(&self) -> String {
        match &self.host {
            Host::Domain(d) => d.clone(),
            Host::Ipv4(ip) => ip.to_string(),
            Host::Ipv6(ip) => ip.to_string(),
        }
    }

    /// The explicit port, or 443. Ports equal to the scheme default are
    /// normalized away by the URL parser and therefore also map to 443.
    pub fn tls_port(&self) -> u16 {
        self.url.port().unwrap_or(DEFAULT_TLS_PORT)
    }

    /// Server name for the TLS handshake. Domains are sent as SNI, IP literals
    /// as IP server names.
    pub fn server_name(&self) -> Result<ServerName<'static>, FetchError> {
        match &self.host {
            Host::Domain(d) => ServerName::try_from(d.clone())
                .map_err(|e| FetchError::Transport(format!("Invalid server name: {}", e))),
            Host::Ipv4(ip) => Ok(ServerName::from(IpAddr::V4(*ip))),
            Host::Ipv6(ip) => Ok(ServerName::from(IpAddr::V6(*ip))),
        }
    }

    /// `scheme://host[:port]`, without a trailing slash.
    pub fn origin(&self) -> String {
        match self.url.port() {
            Some(port) => format!("{}://{}:{}", self.scheme(), self.hostname(), port),
            None => format!("{}://{}", self.scheme(), self.hostname()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_missing_and_malformed() {
        for raw in ["", "   ", "not a url", "/relative/path", "mailto:someone@example.com", "https://"] {
            assert_eq!(PageTarget::parse(raw).unwrap_err(), FetchError::NoUrl, "{raw}");
        }
    }

    #[test]
    fn test_port_defaults_to_443() {
        let target = PageTarget::parse("https://example.com/page").unwrap();
        assert_eq!(target.tls_port(), 443);

        let target = PageTarget::parse("http://example.com/page").unwrap();
        assert_eq!(target.tls_port(), 443);

        let target = PageTarget::parse("https://example.com:8443/").unwrap();
        assert_eq!(target.tls_port(), 8443);
    }

    #[test]
    fn test_origin_keeps_explicit_port() {
        let target = PageTarget::parse("https://example.com/a/b?c=d").unwrap();
        assert_eq!(target.origin(), "https://example.com");

        let target = PageTarget::parse("http://localhost:8080/a").unwrap();
        assert_eq!(target.origin(), "http://localhost:8080");
    }

    #[test]
    fn test_ipv6_host() {
        let target = PageTarget::parse("https://[::1]:9443/").unwrap();
        assert_eq!(target.hostname(), "[::1]");
        assert_eq!(target.dial_host(), "::1");
        assert!(matches!(target.server_name().unwrap(), ServerName::IpAddress(_)));
    }

    #[test]
    fn test_domain_server_name() {
        let target = PageTarget::parse("https://Example.COM/").unwrap();
        assert_eq!(target.hostname(), "example.com");
        assert!(matches!(target.server_name().unwrap(), ServerName::DnsName(_)));
    }
}
