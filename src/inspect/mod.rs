pub mod certificate;
pub mod metadata;
pub mod service;
pub mod types;

pub use certificate::fetch_certificate;
pub use metadata::{fetch_metadata, scrape_metadata};
pub use service::{InspectFuture, NetworkInspector, PageInspector};
pub use types::*;
