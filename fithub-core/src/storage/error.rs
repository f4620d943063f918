//! Storage error types.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by a single backend operation.
#[derive(Error, Debug)]
pub enum BackendError {
    /// I/O error reading or writing a file.
    #[error("I/O error for {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] io::Error),

    /// The local backend's size ceiling would be exceeded.
    #[error("Local storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: u64, quota: u64 },

    /// The backend cannot be reached at all.
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    /// A remote operation was attempted and failed.
    #[error("Remote storage error: {0}")]
    Remote(String),

    /// Key rejected by the backend.
    #[error("Invalid storage key: '{0}'")]
    InvalidKey(String),
}

/// Errors surfaced to callers of the store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Writing the value would push the tracked size over the budget.
    #[error("Storage full: {needed} bytes needed, limit is {limit} bytes")]
    StorageFull { needed: usize, limit: usize },

    /// The value could not be serialized (or decoded into the requested type).
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The local write did not durably succeed.
    #[error("Local storage error: {0}")]
    Local(#[from] BackendError),

    /// An import snapshot has the wrong shape.
    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_full_message() {
        let err = StoreError::StorageFull {
            needed: 600_000,
            limit: 524_288,
        };
        assert_eq!(
            err.to_string(),
            "Storage full: 600000 bytes needed, limit is 524288 bytes"
        );
    }

    #[test]
    fn test_backend_error_wraps_into_store_error() {
        let err: StoreError = BackendError::InvalidKey("a/b".to_string()).into();
        assert!(matches!(err, StoreError::Local(BackendError::InvalidKey(_))));
        assert!(err.to_string().contains("a/b"));
    }
}
