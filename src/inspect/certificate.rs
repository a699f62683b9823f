//! Peer certificate retrieval.
//!
//! Opens a raw TLS connection to the page's host, captures whatever chain the
//! server presents and closes the connection again. Nothing is sent over the
//! encrypted channel.

use super::types::CertificateInfo;
use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::infra::{connect_resolved, connect_tls, HickoryDnsResolver, RustlsTlsProvider};
use crate::shared::cert_parser::extract_cert_info;
use crate::shared::page_url::PageTarget;
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

/// Fetches the certificate presented by the host of `page_url`.
///
/// Resolution, connect and handshake share one `config.timeout` budget. The
/// connection is owned by the handshake future, so it is closed on every exit
/// path: a clean TLS shutdown on success, a drop on error or timeout.
pub async fn fetch_certificate(
    page_url: &str,
    config: &FetchConfig,
) -> Result<CertificateInfo, FetchError> {
    let target = PageTarget::parse(page_url)?;
    let port = target.tls_port();

    tracing::debug!(
        host = %target.hostname(),
        port,
        verification = ?config.cert_verification,
        "Fetching certificate"
    );

    match timeout(config.timeout, handshake(&target, port, config)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::debug!(host = %target.hostname(), port, "Certificate fetch timed out");
            Err(FetchError::CertificateTimeout)
        }
    }
}

async fn handshake(
    target: &PageTarget,
    port: u16,
    config: &FetchConfig,
) -> Result<CertificateInfo, FetchError> {
    let server_name = target.server_name()?;
    let tcp_stream = connect_resolved(&HickoryDnsResolver::new(), &target.dial_host(), port).await?;

    let provider = RustlsTlsProvider::new(config.cert_verification);
    let mut tls_stream = connect_tls(&provider, tcp_stream, server_name).await?;

    let info = extract_cert_info(&tls_stream, config.fingerprint_algorithm);

    if let Err(e) = tls_stream.shutdown().await {
        tracing::debug!(error = %e, "TLS shutdown failed");
    }

    info
}
