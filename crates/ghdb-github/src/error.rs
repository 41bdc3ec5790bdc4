//! Content store error types.
//!
//! Compare-and-swap conflicts are not errors: they come back as tagged
//! outcomes ([`crate::WriteOutcome::Conflict`] and friends) so callers can
//! match on them per case.

/// Errors from content store calls.
#[derive(Debug, thiserror::Error)]
pub enum ContentStoreError {
    /// The repository or file does not exist (or is invisible to the token).
    #[error("not found: {endpoint}")]
    NotFound { endpoint: String },

    /// The path names a directory or other non-file object.
    #[error("{path} is not a file")]
    NotAFile { path: String },

    /// The API rate limit for this token is exhausted.
    #[error("rate limited calling {endpoint} (resets at {reset_at:?})")]
    RateLimited {
        endpoint: String,
        /// Unix timestamp at which the limit resets, when reported.
        reset_at: Option<u64>,
    },

    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },

    /// The store returned an unexpected non-2xx status.
    #[error("{endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// Response deserialization failed.
    #[error("failed to deserialize response from {endpoint}: {source}")]
    Deserialization {
        endpoint: String,
        source: reqwest::Error,
    },

    /// Stored content was not valid base64.
    #[error("invalid content encoding from {endpoint}: {reason}")]
    Encoding { endpoint: String, reason: String },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl ContentStoreError {
    /// Whether the store positively reported the target as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
