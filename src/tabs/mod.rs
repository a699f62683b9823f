//! Tab state for the browser shell.

pub mod registry;

pub use registry::{Tab, TabError, TabId, TabRegistry, BLANK_URL, NEW_TAB_TITLE};
