//! # AES-256-GCM Token Encoding
//!
//! `TokenCipher` holds the derived key; `encode`/`decode` free functions
//! derive it per call for callers that only have the key material.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, URL_SAFE_NO_PAD};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::error::TokenError;

/// Nonce length in bytes (96 bits).
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length in bytes (128 bits).
pub const TAG_LEN: usize = 16;

/// URL-safe alphabet that accepts tokens with or without `=` padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Keyed token cipher.
#[derive(Clone)]
pub struct TokenCipher {
    key: Zeroizing<[u8; 32]>,
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCipher")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl TokenCipher {
    /// Derive the 256-bit key as SHA-256 of `key_material`, so any
    /// passphrase length is accepted.
    pub fn new(key_material: &str) -> Self {
        let digest = Sha256::digest(key_material.as_bytes());
        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(&digest);
        Self { key }
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.key.as_slice()))
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    pub fn encode(&self, plaintext: &str) -> Result<String, TokenError> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        // aes-gcm emits ciphertext || tag; the token layout puts the tag first.
        let sealed = self
            .cipher()
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| TokenError::Encryption(e.to_string()))?;
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

        let mut combined = Vec::with_capacity(NONCE_LEN + TAG_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(tag);
        combined.extend_from_slice(ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(combined))
    }

    /// Decrypt and authenticate a token produced by [`TokenCipher::encode`].
    pub fn decode(&self, token: &str) -> Result<String, TokenError> {
        let combined = URL_SAFE_LENIENT
            .decode(token.trim())
            .map_err(|e| TokenError::MalformedToken(e.to_string()))?;
        if combined.len() < NONCE_LEN + TAG_LEN {
            return Err(TokenError::MalformedToken(format!(
                "expected at least {} bytes, got {}",
                NONCE_LEN + TAG_LEN,
                combined.len()
            )));
        }

        let (nonce, rest) = combined.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(TAG_LEN);
        let mut sealed = Vec::with_capacity(rest.len());
        sealed.extend_from_slice(ciphertext);
        sealed.extend_from_slice(tag);

        let plaintext = self
            .cipher()
            .decrypt(Nonce::from_slice(nonce), sealed.as_slice())
            .map_err(|_| TokenError::AuthenticationFailure)?;

        String::from_utf8(plaintext)
            .map_err(|_| TokenError::MalformedToken("plaintext is not UTF-8".into()))
    }
}

/// Encrypt `plaintext` under `key`. See [`TokenCipher::encode`].
pub fn encode(plaintext: &str, key: &str) -> Result<String, TokenError> {
    TokenCipher::new(key).encode(plaintext)
}

/// Decrypt `token` under `key`. See [`TokenCipher::decode`].
pub fn decode(token: &str, key: &str) -> Result<String, TokenError> {
    TokenCipher::new(key).decode(token)
}
