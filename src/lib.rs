pub mod config;
pub mod error;
pub mod infra;
pub mod inspect;
pub mod routes;
pub mod shared;
pub mod tabs;

#[cfg(test)]
mod test_support;

pub use config::{CertVerification, Config, FetchConfig, FingerprintAlgorithm};
pub use error::FetchError;
pub use inspect::{
    fetch_certificate, fetch_metadata, CertificateInfo, Envelope, NetworkInspector,
    PageInspector, PageMetadata,
};
pub use tabs::{TabId, TabRegistry};
