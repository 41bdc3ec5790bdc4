//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps store, content store, cipher and initialization errors to HTTP
//! status codes with a JSON body. Internal and upstream details are logged,
//! never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ghdb_crypto::TokenError;
use ghdb_github::ContentStoreError;
use ghdb_state::InitError;
use ghdb_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "CONFLICT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed request or unusable identifier (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Well-formed request with semantically invalid content (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing or rejected GitHub credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The document changed since it was read (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// GitHub rate limit exhausted for the caller's token (429).
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Internal server error (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),

    /// GitHub returned an error or is unreachable (502).
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Fetching a linked file failed with an upstream status, passed through.
    #[error("failed to fetch file (upstream status {0})")]
    Fetch(u16),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            Self::Fetch(status) => (
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                "UPSTREAM_ERROR",
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::Upstream(_) => "An upstream service error occurred".to_string(),
            Self::Fetch(_) => "Failed to fetch file from GitHub".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::Upstream(_) | Self::Fetch(_) => tracing::error!(error = %self, "upstream error"),
            Self::RateLimited(_) => tracing::warn!(error = %self, "rate limited"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ContentStoreError> for AppError {
    fn from(err: ContentStoreError) -> Self {
        match &err {
            ContentStoreError::NotFound { .. } => Self::NotFound(err.to_string()),
            ContentStoreError::NotAFile { .. } => Self::Validation(err.to_string()),
            ContentStoreError::RateLimited { .. } => Self::RateLimited(err.to_string()),
            ContentStoreError::Api { status: 401, .. } => {
                Self::Unauthorized("GitHub rejected the credentials".into())
            }
            ContentStoreError::Config(_) => Self::Internal(err.to_string()),
            _ => Self::Upstream(err.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Store(e) => e.into(),
            StoreError::Invalid(e) => Self::Validation(e.to_string()),
            StoreError::CorruptDocument(e) => Self::Internal(e.to_string()),
            other @ StoreError::NotFound { .. } => Self::NotFound(other.to_string()),
            other @ StoreError::StaleWrite { .. } => Self::Conflict(other.to_string()),
        }
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::MalformedToken(_) | TokenError::AuthenticationFailure => {
                Self::BadRequest("Invalid file identifier".into())
            }
            other @ TokenError::Encryption(_) => Self::Internal(other.to_string()),
        }
    }
}

impl From<InitError> for AppError {
    fn from(err: InitError) -> Self {
        Self::Upstream(err.reason)
    }
}
