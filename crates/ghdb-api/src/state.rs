//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers
//! via the `State` extractor. Everything here is cheap to clone: stores
//! hold an `Arc<dyn ContentStore>`, the session registry an `Arc<Mutex<_>>`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use ghdb_crypto::TokenCipher;
use ghdb_github::ContentStore;
use ghdb_state::{AuthState, InitCoordinator};
use ghdb_store::{ConfigStore, MappingStore, TokenPolicy};
use parking_lot::Mutex;
use zeroize::Zeroizing;

use crate::identity::IdentityCache;

/// Links are only resolved to URLs under this prefix unless overridden.
pub const DEFAULT_RAW_URL_PREFIX: &str = "https://raw.githubusercontent.com/";

const DEFAULT_PORT: u16 = 8080;
const FETCH_TIMEOUT_SECS: u64 = 30;

/// Application configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Key material for the link token cipher.
    pub url_key: Zeroizing<String>,
    /// Origin used to build masked link URLs, without a trailing slash.
    pub public_origin: String,
    /// Only decoded URLs under this prefix are fetched.
    pub raw_url_prefix: String,
    pub token_policy: TokenPolicy,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("url_key", &"[REDACTED]")
            .field("public_origin", &self.public_origin)
            .field("raw_url_prefix", &self.raw_url_prefix)
            .field("token_policy", &self.token_policy)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `PORT` (default: 8080)
    /// - `URL_ENCRYPTION_KEY` (required)
    /// - `PUBLIC_ORIGIN` (default: `http://localhost:<port>`)
    /// - `RAW_URL_PREFIX` (default: `https://raw.githubusercontent.com/`)
    /// - `GHDB_TOKEN_REUSE` (`true` to reuse tokens by URL; default: always mint)
    pub fn from_env() -> Result<Self, StartupError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| StartupError::InvalidValue("PORT", raw))?,
            Err(_) => DEFAULT_PORT,
        };

        let url_key = std::env::var("URL_ENCRYPTION_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(Zeroizing::new)
            .ok_or(StartupError::Missing("URL_ENCRYPTION_KEY"))?;

        let public_origin = std::env::var("PUBLIC_ORIGIN")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        let raw_url_prefix = std::env::var("RAW_URL_PREFIX")
            .unwrap_or_else(|_| DEFAULT_RAW_URL_PREFIX.to_string());

        let token_policy = match std::env::var("GHDB_TOKEN_REUSE") {
            Ok(v) if v.eq_ignore_ascii_case("true") => TokenPolicy::ReuseByUrl,
            _ => TokenPolicy::AlwaysMint,
        };

        Ok(Self {
            port,
            url_key,
            public_origin,
            raw_url_prefix,
            token_policy,
        })
    }

    /// Masked URL for a link token.
    pub fn link_url(&self, token: &str) -> String {
        format!("{}/f/{token}", self.public_origin)
    }
}

/// Errors building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("environment variable {0} is required")]
    Missing(&'static str),
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(&'static str, String),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Per-login initialization coordinators.
///
/// Logins are case-insensitive on GitHub, so keys are lowercased.
#[derive(Clone)]
pub struct SessionRegistry {
    store: ConfigStore,
    sessions: Arc<Mutex<HashMap<String, InitCoordinator>>>,
}

impl SessionRegistry {
    pub fn new(store: ConfigStore) -> Self {
        Self {
            store,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The coordinator for `login`, created on first use.
    pub fn coordinator(&self, login: &str) -> InitCoordinator {
        self.sessions
            .lock()
            .entry(login.to_ascii_lowercase())
            .or_insert_with(|| InitCoordinator::new(Arc::new(self.store.clone())))
            .clone()
    }

    /// Session state for `login`; `Unauthenticated` if it never started.
    pub fn state(&self, login: &str) -> AuthState {
        self.sessions
            .lock()
            .get(&login.to_ascii_lowercase())
            .map(InitCoordinator::state)
            .unwrap_or(AuthState::Unauthenticated)
    }

    /// Reset and forget the session for `login`.
    pub fn logout(&self, login: &str) {
        if let Some(coordinator) = self.sessions.lock().remove(&login.to_ascii_lowercase()) {
            coordinator.logout();
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub cipher: TokenCipher,
    pub config_store: ConfigStore,
    pub mappings: MappingStore,
    pub sessions: SessionRegistry,
    /// Owners of bearer tokens.
    pub identities: IdentityCache,
    /// Client for fetching linked files. Sends no credentials.
    pub http: reqwest::Client,
}

impl AppState {
    /// Build the state over a content store.
    pub fn new(config: AppConfig, store: Arc<dyn ContentStore>) -> Result<Self, StartupError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;
        let config_store = ConfigStore::new(Arc::clone(&store));
        Ok(Self {
            identities: IdentityCache::new(Arc::clone(&store)),
            cipher: TokenCipher::new(&config.url_key),
            mappings: MappingStore::new(store).with_policy(config.token_policy),
            sessions: SessionRegistry::new(config_store.clone()),
            config_store,
            config: Arc::new(config),
            http,
        })
    }
}
