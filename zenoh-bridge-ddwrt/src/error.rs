//! Error types for router polling.

use thiserror::Error;

/// Errors raised while fetching or parsing router status pages.
///
/// Every variant aborts the poll of the router it occurred on.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The router rejected the credentials.
    #[error("Authentication rejected by {url} (HTTP {status})")]
    Auth { url: String, status: u16 },

    /// Transport failure or a non-200 response.
    #[error("Request to {url} failed: {message}")]
    Network { url: String, message: String },

    /// Malformed status text.
    #[error("Malformed router data: {0}")]
    Parse(String),

    /// Numeric field with a unit suffix other than K, M or G.
    #[error("Unknown unit '{unit}' in value '{value}'")]
    UnknownUnit { unit: char, value: String },

    /// Expected key absent from a status page.
    #[error("Key '{key}' missing from page '{page}'")]
    MissingKey { page: String, key: String },
}

impl RouterError {
    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

/// Result type alias using [`RouterError`].
pub type Result<T> = std::result::Result<T, RouterError>;
