//! Error types for newsdesk.

use std::path::PathBuf;

use thiserror::Error;

/// Common error type for newsdesk.
#[derive(Error, Debug)]
pub enum NewsError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing the persisted news state failed.
    ///
    /// Never swallowed: losing the last-posted marker leads to duplicate posts.
    #[error("failed to persist news state to {path}: {source}")]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The persisted news state exists but is not valid.
    #[error("invalid news state in {path}: {reason}")]
    StateFormat { path: PathBuf, reason: String },

    /// A feed could not be fetched or parsed.
    #[error("feed unavailable: {0}")]
    FetchUnavailable(String),

    /// The delivery boundary rejected a request.
    #[error("delivery error: {0}")]
    Delivery(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),
}

/// Result type alias for newsdesk operations.
pub type Result<T> = std::result::Result<T, NewsError>;
