use backend::BackendError;
use thiserror::Error;

/// Errors from cache and session snapshot operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the persisted snapshot failed.
    #[error("Snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A snapshot or record could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The authoritative refresh against the backend failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
