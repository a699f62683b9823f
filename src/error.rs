use std::error::Error as StdError;
use thiserror::Error;

/// Failures of the certificate and metadata fetchers.
///
/// The `Display` text is what the shell shows, so variants carry the final
/// user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("No URL")]
    NoUrl,

    #[error("Protocol \"{0}:\" not supported")]
    UnsupportedProtocol(String),

    #[error("{0}")]
    Transport(String),

    #[error("Timeout fetching certificate")]
    CertificateTimeout,

    #[error("Timeout")]
    Timeout,

    #[error("No certificate returned")]
    NoCertificate,

    #[error("Parse error: {0}")]
    Parse(String),
}

impl FetchError {
    /// Wraps any error as a transport failure, keeping its source chain.
    pub fn transport(err: &(dyn StdError + 'static)) -> Self {
        Self::Transport(error_chain(err))
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::transport(&err)
        }
    }
}

/// Joins an error with its sources, e.g. `error sending request: connection refused`.
///
/// reqwest and hyper keep the useful part of a message in the source chain.
pub fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
