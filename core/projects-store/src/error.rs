//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from MongoDB.
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend refused the record itself.
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Unusable connection settings.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<projects_types::Error> for StoreError {
    fn from(err: projects_types::Error) -> Self {
        StoreError::InvalidRecord(err.to_string())
    }
}
