//! Error taxonomy for engine operations.

use thiserror::Error;

/// Failure returned synchronously by a store operation. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Empty, out-of-range, or unknown input.
    #[error("invalid input: {0}")]
    Validation(String),
    /// A record with the same id already exists.
    #[error("conflict: {0}")]
    Conflict(String),
    /// An operation referenced a record that is not in the table.
    #[error("not found: {0}")]
    NotFound(String),
}

impl StoreError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
