//! GitHub client configuration.
//!
//! The base URL is overridable so tests can point the client at a local
//! mock server and deployments at GitHub Enterprise.

use url::Url;

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for [`crate::GithubClient`].
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// REST API base URL. Default: <https://api.github.com>
    pub api_url: Url,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl GithubConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `GITHUB_API_URL` (default: `https://api.github.com`)
    /// - `GHDB_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_url = env_url("GITHUB_API_URL", DEFAULT_API_URL)?;
        let timeout_secs = match std::env::var("GHDB_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("GHDB_TIMEOUT_SECS".into(), raw))?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };
        Ok(Self {
            api_url,
            timeout_secs,
        })
    }

    /// Configuration pointing at a local mock server.
    pub fn local_mock(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: Url::parse(base_url)
                .map_err(|e| ConfigError::InvalidUrl(base_url.to_string(), e.to_string()))?,
            timeout_secs: 5,
        })
    }
}

fn env_url(var: &str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(String, String),
    #[error("base URL {0} cannot carry path segments")]
    CannotBeABase(String),
    #[error("token contains characters not allowed in an HTTP header")]
    InvalidToken,
}
