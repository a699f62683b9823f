//! DNS resolution and TCP connection setup.
//!
//! Provides a trait-based abstraction for DNS resolution so the connect path
//! can be exercised without a real resolver.

use crate::error::FetchError;
use hickory_resolver::{
    config::*,
    error::{ResolveError, ResolveErrorKind},
    TokioAsyncResolver,
};
use std::{net::IpAddr, sync::Arc};
use tokio::{net::TcpStream, sync::OnceCell};

/// Trait for DNS resolution.
///
/// Lets the connect path run against a fixed address list in tests.
#[allow(async_fn_in_trait)]
pub trait DnsResolver: Send + Sync {
    /// Resolves a hostname to one or more IP addresses.
    ///
    /// # Arguments
    ///
    /// * `host` - The hostname or IP literal to resolve
    ///
    /// # Returns
    ///
    /// The resolved addresses in resolver order, or a transport error naming the host.
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, FetchError>;
}

/// Global resolver instance, created on first use.
static DNS_RESOLVER: OnceCell<Arc<TokioAsyncResolver>> = OnceCell::const_new();

async fn get_resolver() -> Arc<TokioAsyncResolver> {
    DNS_RESOLVER
        .get_or_init(|| async {
            Arc::new(TokioAsyncResolver::tokio(
                ResolverConfig::default(),
                ResolverOpts::default(),
            ))
        })
        .await
        .clone()
}

/// DNS resolver backed by hickory-resolver.
#[derive(Default)]
pub struct HickoryDnsResolver;

impl HickoryDnsResolver {
    pub fn new() -> Self {
        Self
    }
}

impl DnsResolver for HickoryDnsResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, FetchError> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        let resolver = get_resolver().await;
        let response = resolver
            .lookup_ip(host)
            .await
            .map_err(|e| resolve_error(host, &e))?;

        let ips: Vec<IpAddr> = response.iter().collect();
        if ips.is_empty() {
            return Err(FetchError::Transport(format!(
                "getaddrinfo {}: no addresses",
                host
            )));
        }
        tracing::debug!(host, count = ips.len(), "Resolved host");
        Ok(ips)
    }
}

/// Maps a resolver failure to a message fit for display. Resolver errors
/// render their full query in `Debug` form, so the common cases are named.
fn resolve_error(host: &str, err: &ResolveError) -> FetchError {
    let reason = match err.kind() {
        ResolveErrorKind::NoRecordsFound { .. } => "not found".to_string(),
        ResolveErrorKind::Timeout => "timed out".to_string(),
        ResolveErrorKind::NoConnections => "no name servers available".to_string(),
        _ => err.to_string(),
    };
    FetchError::Transport(format!("getaddrinfo {}: {}", host, reason))
}

/// Resolves `host` and connects to the first address that accepts.
///
/// # Arguments
///
/// * `resolver` - Resolver used for the lookup
/// * `host` - Hostname or IP literal to connect to
/// * `port` - TCP port
///
/// # Returns
///
/// The first stream that connects, trying addresses in resolver order, or the
/// last connect error when none succeed.
pub async fn connect_resolved<R: DnsResolver>(
    resolver: &R,
    host: &str,
    port: u16,
) -> Result<TcpStream, FetchError> {
    let ips = resolver.resolve(host).await?;

    let mut last_error = None;
    for ip in ips {
        match TcpStream::connect((ip, port)).await {
            Ok(stream) => {
                tracing::debug!(%ip, port, "TCP connected");
                return Ok(stream);
            }
            Err(e) => {
                tracing::debug!(%ip, port, error = %e, "TCP connect failed");
                last_error = Some(FetchError::Transport(format!(
                    "connect {}:{}: {}",
                    ip, port, e
                )));
            }
        }
    }

    Err(last_error
        .unwrap_or_else(|| FetchError::Transport(format!("connect {}:{}: no addresses", host, port))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    struct StaticResolver(Vec<IpAddr>);

    impl DnsResolver for StaticResolver {
        async fn resolve(&self, _host: &str) -> Result<Vec<IpAddr>, FetchError> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_resolve_ip_address() {
        let resolver = HickoryDnsResolver::new();
        let ips = resolver.resolve("127.0.0.1").await.unwrap();
        assert_eq!(ips, vec!["127.0.0.1".parse::<IpAddr>().unwrap()]);
    }

    #[tokio::test]
    async fn test_resolve_ipv6_address() {
        let resolver = HickoryDnsResolver::new();
        let ips = resolver.resolve("::1").await.unwrap();
        assert_eq!(ips.len(), 1);
        assert_eq!(ips[0].to_string(), "::1");
    }

    #[tokio::test]
    async fn test_connect_open_and_refused_ports() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let closed = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let closed_port = closed.local_addr().unwrap().port();
        drop(closed);

        let resolver = StaticResolver(vec!["127.0.0.1".parse().unwrap()]);
        assert!(connect_resolved(&resolver, "local", port).await.is_ok());

        let err = connect_resolved(&resolver, "local", closed_port)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Transport(ref m) if m.contains("connect 127.0.0.1")));
    }

    #[test]
    fn test_missing_records_read_as_not_found() {
        use hickory_resolver::proto::op::{Query, ResponseCode};
        use hickory_resolver::proto::rr::RecordType;
        use hickory_resolver::Name;

        let err = ResolveError::from(ResolveErrorKind::NoRecordsFound {
            query: Box::new(Query::query(
                Name::from_ascii("nonexistent.invalid.").unwrap(),
                RecordType::AAAA,
            )),
            soa: None,
            negative_ttl: None,
            response_code: ResponseCode::NXDomain,
            trusted: true,
        });

        assert_eq!(
            resolve_error("nonexistent.invalid", &err),
            FetchError::Transport("getaddrinfo nonexistent.invalid: not found".into())
        );
    }

    #[test]
    fn test_resolver_timeout_message() {
        let err = ResolveError::from(ResolveErrorKind::Timeout);
        assert_eq!(
            resolve_error("slow.example", &err),
            FetchError::Transport("getaddrinfo slow.example: timed out".into())
        );
    }

    #[tokio::test]
    async fn test_connect_with_no_addresses() {
        let resolver = StaticResolver(Vec::new());
        let err = connect_resolved(&resolver, "nowhere", 443).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(ref m) if m.contains("no addresses")));
    }
}
