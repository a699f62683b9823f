//! Inspection service abstraction layer.
//!
//! The routes talk to a [`PageInspector`] rather than to the fetchers
//! directly, so handlers can be tested without network access.

use super::certificate::fetch_certificate;
use super::metadata::fetch_metadata;
use super::types::{CertificatePayload, Envelope, PageMetadata};
use crate::config::FetchConfig;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type InspectFuture<'a, T> = Pin<Box<dyn Future<Output = Envelope<T>> + Send + 'a>>;

/// The two boundary operations offered to the shell.
pub trait PageInspector: Send + Sync {
    /// `get-certificate`
    fn certificate(&self, url: String) -> InspectFuture<'_, CertificatePayload>;

    /// `fetch-metadata`
    fn metadata(&self, url: String) -> InspectFuture<'_, PageMetadata>;
}

/// Inspector that performs real network fetches.
#[derive(Debug, Default, Clone)]
pub struct NetworkInspector {
    config: FetchConfig,
}

impl NetworkInspector {
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    /// Creates a new `NetworkInspector` wrapped in an `Arc`.
    pub fn arc(config: FetchConfig) -> Arc<Self> {
        Arc::new(Self::new(config))
    }
}

impl PageInspector for NetworkInspector {
    fn certificate(&self, url: String) -> InspectFuture<'_, CertificatePayload> {
        Box::pin(async move {
            Envelope::from(
                fetch_certificate(&url, &self.config)
                    .await
                    .map(|cert| CertificatePayload { cert }),
            )
        })
    }

    fn metadata(&self, url: String) -> InspectFuture<'_, PageMetadata> {
        Box::pin(async move { Envelope::from(fetch_metadata(&url, &self.config).await) })
    }
}
