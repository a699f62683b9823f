//! Infrastructure layer providing abstractions for external dependencies.
//!
//! This module contains traits and implementations for:
//! - DNS resolution and TCP connect
//! - TLS client connections

pub mod dns;
pub mod tls;

pub use dns::{connect_resolved, DnsResolver, HickoryDnsResolver};
pub use tls::{connect_tls, create_tls_config, AcceptAnyServerCert, RustlsTlsProvider, TlsProvider};
