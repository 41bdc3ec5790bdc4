//! # Token Identity
//!
//! The login header is only a claim. [`IdentityCache`] asks the content
//! store who owns the bearer token and rejects a claim that names anyone
//! else, so a session can only be reached with its owner's token.
//!
//! Resolved logins are cached by SHA-256 of the token; raw tokens are
//! never kept. The cache is cleared once it reaches
//! [`MAX_CACHED_IDENTITIES`] entries.

use std::collections::HashMap;
use std::sync::Arc;

use ghdb_github::{ContentStore, Credentials};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use crate::error::AppError;

pub const MAX_CACHED_IDENTITIES: usize = 4096;

type TokenDigest = [u8; 32];

/// Token owner lookups, cached per token.
#[derive(Clone)]
pub struct IdentityCache {
    store: Arc<dyn ContentStore>,
    logins: Arc<Mutex<HashMap<TokenDigest, String>>>,
}

fn digest(token: &str) -> TokenDigest {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(token.as_bytes()));
    out
}

impl IdentityCache {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            logins: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check that the token in `creds` belongs to `creds.login()`.
    /// Logins compare case-insensitively.
    pub async fn verify(&self, creds: &Credentials) -> Result<(), AppError> {
        let owner = self.owner(creds).await?;
        if owner.eq_ignore_ascii_case(creds.login()) {
            Ok(())
        } else {
            tracing::warn!(claimed = creds.login(), "login header does not match token owner");
            Err(AppError::Unauthorized("login does not match the token".into()))
        }
    }

    async fn owner(&self, creds: &Credentials) -> Result<String, AppError> {
        let key = digest(creds.token());
        if let Some(login) = self.logins.lock().get(&key) {
            return Ok(login.clone());
        }

        let login = self.store.authenticated_login(creds).await?;
        let mut logins = self.logins.lock();
        if logins.len() >= MAX_CACHED_IDENTITIES {
            logins.clear();
        }
        logins.insert(key, login.clone());
        Ok(login)
    }

    pub fn len(&self) -> usize {
        self.logins.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
