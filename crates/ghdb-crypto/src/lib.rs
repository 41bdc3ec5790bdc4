//! # ghdb-crypto: Token Cipher
//!
//! Turns a target URL into an opaque, URL-safe token and back. A token is
//! self-contained: decoding needs only the key, never a store lookup.
//!
//! ```text
//! token = base64url_nopad( nonce[12] || tag[16] || ciphertext )
//! key   = SHA-256(key material)
//! ```
//!
//! ## Security Invariant
//!
//! - AES-256-GCM authenticates every token; a flipped bit anywhere or a
//!   different key yields [`TokenError::AuthenticationFailure`].
//! - A fresh random nonce per `encode`: the same URL never encodes to the
//!   same token twice. Callers that want stable tokens must look up prior
//!   tokens by URL themselves.
//! - Key bytes are zeroized on drop and redacted from `Debug`.
//!
//! ## Crate Policy
//!
//! - Depends on no other `ghdb-*` crate.
//! - No mocking of cryptographic operations in tests.

pub mod error;
pub mod token;

pub use error::TokenError;
pub use token::{decode, encode, TokenCipher, NONCE_LEN, TAG_LEN};
