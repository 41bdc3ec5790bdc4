//! Token cipher errors.

use thiserror::Error;

/// Errors from encoding or decoding a token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The input is not URL-safe base64, is too short to hold a nonce and
    /// tag, or decrypts to something that is not UTF-8.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// The authentication tag did not verify: the token was altered or was
    /// produced under a different key.
    #[error("token authentication failed")]
    AuthenticationFailure,

    /// The cipher refused to encrypt (plaintext exceeds GCM limits).
    #[error("token encryption failed: {0}")]
    Encryption(String),
}
