use thiserror::Error;

use crate::storage::StoreError;

/// Errors from repository operations.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The input was rejected before anything was stored.
    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}
