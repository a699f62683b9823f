//! TLS client configuration and connection handling.
//!
//! The certificate fetcher has to complete handshakes with servers whose
//! chains do not validate, so the provider can be built either with the
//! Mozilla root store or with [`AcceptAnyServerCert`].

use crate::config::CertVerification;
use crate::error::FetchError;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{self, CryptoProvider};
use rustls::{DigitallySignedStruct, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::{client::TlsStream, TlsConnector};

/// Trait for TLS configuration providers.
///
/// Separates how the client config is assembled from the handshake itself.
pub trait TlsProvider: Send + Sync {
    /// Creates a new TLS client configuration.
    fn client_config(&self) -> Result<Arc<rustls::ClientConfig>, FetchError>;

    /// Creates a TLS connector from this provider's configuration.
    fn connector(&self) -> Result<TlsConnector, FetchError> {
        Ok(TlsConnector::from(self.client_config()?))
    }
}

/// rustls provider using the ring crypto backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct RustlsTlsProvider {
    verification: CertVerification,
}

impl RustlsTlsProvider {
    /// Creates a new `RustlsTlsProvider` for the given verification mode.
    pub fn new(verification: CertVerification) -> Self {
        Self { verification }
    }
}

impl TlsProvider for RustlsTlsProvider {
    fn client_config(&self) -> Result<Arc<rustls::ClientConfig>, FetchError> {
        create_tls_config(self.verification)
            .map_err(|e| FetchError::Transport(format!("TLS configuration failed: {}", e)))
    }
}

fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(crypto::ring::default_provider())
}

/// Creates a TLS 1.2/1.3 client configuration without client authentication.
///
/// # Arguments
///
/// * `verification` - `WebPki` trusts the webpki-roots store; `AcceptAny`
///   installs [`AcceptAnyServerCert`]
///
/// # Returns
///
/// A shareable `ClientConfig`, or the rustls error if the protocol versions
/// cannot be set on the ring provider.
pub fn create_tls_config(
    verification: CertVerification,
) -> Result<Arc<rustls::ClientConfig>, rustls::Error> {
    let provider = crypto_provider();
    let builder = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()?;

    let config = match verification {
        CertVerification::WebPki => {
            let root_store =
                rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            builder
                .with_root_certificates(root_store)
                .with_no_client_auth()
        }
        CertVerification::AcceptAny => builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert::new(provider)))
            .with_no_client_auth(),
    };

    Ok(Arc::new(config))
}

/// Verifier that accepts any server certificate chain.
///
/// Handshake signatures are still checked against the presented leaf, so the
/// peer must hold the key for the certificate we end up displaying.
#[derive(Debug)]
pub struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl AcceptAnyServerCert {
    pub fn new(provider: Arc<CryptoProvider>) -> Self {
        Self { provider }
    }
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Establishes a TLS connection over an existing TCP stream.
///
/// # Arguments
///
/// * `provider` - The TLS provider to use for configuration
/// * `tcp_stream` - The established TCP connection
/// * `server_name` - The server name for SNI
///
/// # Returns
///
/// The TLS stream on success, or a transport error prefixed with
/// `TLS handshake failed`.
pub async fn connect_tls<P: TlsProvider>(
    provider: &P,
    tcp_stream: TcpStream,
    server_name: ServerName<'static>,
) -> Result<TlsStream<TcpStream>, FetchError> {
    let connector = provider.connector()?;

    connector
        .connect(server_name, tcp_stream)
        .await
        .map_err(|e| FetchError::Transport(format!("TLS handshake failed: {}", e)))
}
