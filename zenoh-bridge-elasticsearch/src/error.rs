//! Error types for cluster stats requests.

use thiserror::Error;

/// Errors raised by a single cluster API request.
///
/// These never abort a collection pass: the caller logs them and skips the
/// affected metric group.
#[derive(Debug, Error)]
pub enum ClusterError {
    /// Connection or transport failure.
    #[error("Request to {url} failed: {message}")]
    Network { url: String, message: String },

    /// Non-success HTTP status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Body is not valid JSON.
    #[error("Invalid JSON from {url}: {message}")]
    Parse { url: String, message: String },

    /// Required top-level key absent from the document.
    #[error("Key '{key}' missing from {url}")]
    MissingKey { url: String, key: String },
}

/// Result type alias using [`ClusterError`].
pub type Result<T> = std::result::Result<T, ClusterError>;
