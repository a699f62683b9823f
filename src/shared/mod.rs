//! Shared utilities used by both fetchers.

pub mod body;
pub mod cert_parser;
pub mod markup;
pub mod page_url;

pub use body::CappedText;
pub use cert_parser::{fingerprint, parse_x509_basic, BasicCertInfo};
pub use page_url::PageTarget;
