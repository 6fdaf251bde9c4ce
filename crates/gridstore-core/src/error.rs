use thiserror::Error;

/// Errors that can occur in the storage layer.
///
/// Reads never produce an error for an absent table; absence is represented
/// as a schema-shaped empty [`crate::TableData`]. `NotFound` is reserved for
/// write paths where a missing resource cannot be papered over.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Lock error: {0}")]
    Lock(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Whether the error is a transient quota/rate-limit condition that a
    /// retry with backoff may resolve.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, StoreError::RateLimited(_))
    }
}
