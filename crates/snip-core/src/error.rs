use thiserror::Error;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Failures raised by a storage backend.
///
/// These are never retried by the engine; they surface unchanged through
/// [`ShortenerError::Storage`].
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    Decode(String),
    #[error("storage io failed: {0}")]
    Io(String),
    #[error("storage backend is closed")]
    Closed,
}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("link not found: {0}")]
    NotFound(String),
    #[error("link deleted: {0}")]
    Deleted(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
