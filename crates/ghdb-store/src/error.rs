//! Store error types.

use ghdb_core::{DocumentError, ValidationError};
use ghdb_github::ContentStoreError;

/// Errors from the config and mapping stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The service entity or the document does not exist yet.
    #[error("{what} not found")]
    NotFound { what: String },

    /// The document changed between read and write. Nothing was written.
    #[error("{path} changed since it was read")]
    StaleWrite { path: String },

    /// The stored document does not match its schema.
    #[error("corrupt document: {0}")]
    CorruptDocument(#[from] DocumentError),

    /// A login or repository reference failed validation.
    #[error("invalid input: {0}")]
    Invalid(#[from] ValidationError),

    /// Failure from the content store, propagated unchanged.
    #[error("content store error: {0}")]
    Store(#[from] ContentStoreError),
}
