use common::RecordId;
use thiserror::Error;

/// Errors that can occur when interacting with the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The referenced row does not exist.
    #[error("row {id} not found in table '{table}'")]
    RowNotFound { table: String, id: RecordId },

    /// The backend rejected a write (constraint violation, injected fault,
    /// quota, ...). The reason is whatever the backend reported.
    #[error("write to '{target}' rejected: {reason}")]
    Rejected { target: String, reason: String },

    /// An upload targeted a path that is already occupied. Uploads never
    /// overwrite.
    #[error("object already exists at '{bucket}/{path}'")]
    ObjectExists { bucket: String, path: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for backend operations.
pub type Result<T> = std::result::Result<T, BackendError>;
