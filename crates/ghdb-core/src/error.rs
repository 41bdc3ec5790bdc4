//! # Error Types
//!
//! Validation and schema errors raised by the pure types in this crate.
//! Store-level failures (not found, conflicts, transport) live in the
//! crates that perform IO.

use thiserror::Error;

/// A user-supplied identifier failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Repository name is empty or whitespace.
    #[error("repository name is required")]
    EmptyName,

    /// Repository name exceeds the hosting limit.
    #[error("repository name must be 100 characters or less")]
    NameTooLong,

    /// Repository name contains characters outside `[A-Za-z0-9._-]`.
    #[error("repository name can only contain alphanumeric characters, hyphens, underscores, and periods")]
    InvalidCharacters,

    /// Repository name starts with `.` or `-`.
    #[error("repository name cannot start with a period or hyphen")]
    InvalidStart,

    /// Repository name ends with `.`.
    #[error("repository name cannot end with a period")]
    InvalidEnd,

    /// Repository name is reserved by the hosting service.
    #[error("repository name '{0}' is reserved")]
    Reserved(String),

    /// Qualified name is not of the form `owner/name`.
    #[error("qualified name must be of the form owner/name, got '{0}'")]
    MalformedQualifiedName(String),
}

/// A stored document could not be parsed against its schema.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The bytes are not valid JSON for the expected schema.
    #[error("{document} does not match its schema: {source}")]
    Schema {
        /// Which document failed (`config.json`, `url-mappings.json`).
        document: &'static str,
        /// Underlying serde error.
        source: serde_json::Error,
    },

    /// Serialization of a document failed.
    #[error("failed to serialize {document}: {source}")]
    Serialize {
        /// Which document failed.
        document: &'static str,
        /// Underlying serde error.
        source: serde_json::Error,
    },
}
