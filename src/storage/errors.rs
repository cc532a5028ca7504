//! Error types for storage engine operations

use thiserror::Error;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Failures surfaced by a storage engine
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store could not be opened or created at the given path
    #[error("Failed to open store at {path}: {message}")]
    Open { path: String, message: String },

    /// On-disk data failed an integrity check
    #[error("Store corruption detected: {0}")]
    Corruption(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure (transaction, table, commit)
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<redb::Error> for StorageError {
    fn from(error: redb::Error) -> Self {
        match error {
            redb::Error::Io(io) => StorageError::Io(io),
            redb::Error::Corrupted(message) => StorageError::Corruption(message),
            other => StorageError::Backend(other.to_string()),
        }
    }
}

macro_rules! impl_from_redb {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StorageError {
                fn from(error: $ty) -> Self {
                    StorageError::from(redb::Error::from(error))
                }
            }
        )*
    };
}

impl_from_redb!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

impl StorageError {
    /// Check if the failure may succeed when retried
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Io(_))
    }
}
