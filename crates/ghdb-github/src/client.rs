//! # GitHub REST Client
//!
//! `GithubClient` implements [`ContentStore`] over the GitHub REST v3 API.
//! One client serves every caller: credentials travel with each call and
//! become the `Authorization: token <t>` header of that request only.
//!
//! Status mapping shared by every endpoint:
//!
//! | Status                              | Result                     |
//! |-------------------------------------|----------------------------|
//! | 404                                 | `NotFound` (or `None`)     |
//! | 429, or 403 with no requests left   | `RateLimited`              |
//! | other non-2xx                       | `Api { status, body }`     |
//!
//! Endpoint-specific conflict statuses are handled in `contents` and
//! `repos`. No request is retried.

use std::time::Duration;

use async_trait::async_trait;
use ghdb_core::{QualifiedName, RevisionTag};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use url::Url;

use crate::config::{ConfigError, GithubConfig};
use crate::credentials::Credentials;
use crate::error::ContentStoreError;
use crate::store::{
    ContentStore, CreateOutcome, DeleteOutcome, FileWrite, Repository, StoredFile, WriteOutcome,
};

const ACCEPT_V3: &str = "application/vnd.github.v3+json";
const CLIENT_USER_AGENT: &str = "ghdb";

/// Committer name recorded on every commit the client makes.
pub const COMMITTER_NAME: &str = "db3 service";

/// GitHub-backed content store.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GithubClient {
    /// Create a client from configuration.
    pub fn new(config: GithubConfig) -> Result<Self, ContentStoreError> {
        if config.api_url.cannot_be_a_base() {
            return Err(ConfigError::CannotBeABase(config.api_url.to_string()).into());
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_V3));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ContentStoreError::Http {
                endpoint: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            base_url: config.api_url,
        })
    }

    /// Base URL with `segments` appended, each percent-encoded.
    pub(crate) fn endpoint_url<'a>(
        &self,
        segments: impl IntoIterator<Item = &'a str>,
    ) -> Result<Url, ContentStoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ConfigError::CannotBeABase(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start an authenticated request.
    pub(crate) fn request(
        &self,
        method: Method,
        url: Url,
        creds: &Credentials,
    ) -> Result<RequestBuilder, ContentStoreError> {
        let mut auth = HeaderValue::from_str(&format!("token {}", creds.token()))
            .map_err(|_| ConfigError::InvalidToken)?;
        auth.set_sensitive(true);
        Ok(self.http.request(method, url).header(AUTHORIZATION, auth))
    }

    /// Send a request, mapping transport failures.
    pub(crate) async fn send(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<Response, ContentStoreError> {
        let resp = request.send().await.map_err(|e| ContentStoreError::Http {
            endpoint: endpoint.to_string(),
            source: e,
        })?;
        tracing::debug!(endpoint, status = resp.status().as_u16(), "github response");
        Ok(resp)
    }
}

/// Map a non-success response that no endpoint-specific rule claimed.
pub(crate) async fn status_error(endpoint: &str, resp: Response) -> ContentStoreError {
    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return ContentStoreError::NotFound {
            endpoint: endpoint.to_string(),
        };
    }

    let remaining = header_u64(&resp, "x-ratelimit-remaining");
    if status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN && remaining == Some(0))
    {
        let reset_at = header_u64(&resp, "x-ratelimit-reset");
        tracing::warn!(endpoint, ?reset_at, "github rate limit exhausted");
        return ContentStoreError::RateLimited {
            endpoint: endpoint.to_string(),
            reset_at,
        };
    }

    let body = resp.text().await.unwrap_or_default();
    ContentStoreError::Api {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        body,
    }
}

fn header_u64(resp: &Response, name: &str) -> Option<u64> {
    resp.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[async_trait]
impl ContentStore for GithubClient {
    async fn read_file(
        &self,
        creds: &Credentials,
        repo: &QualifiedName,
        path: &str,
    ) -> Result<StoredFile, ContentStoreError> {
        self.get_contents(creds, repo, path).await
    }

    async fn write_file(
        &self,
        creds: &Credentials,
        repo: &QualifiedName,
        path: &str,
        write: FileWrite,
    ) -> Result<WriteOutcome, ContentStoreError> {
        self.put_contents(creds, repo, path, write).await
    }

    async fn delete_file(
        &self,
        creds: &Credentials,
        repo: &QualifiedName,
        path: &str,
        revision: &RevisionTag,
        message: &str,
    ) -> Result<DeleteOutcome, ContentStoreError> {
        self.delete_contents(creds, repo, path, revision, message)
            .await
    }

    async fn create_repository(
        &self,
        creds: &Credentials,
        name: &str,
        private: bool,
    ) -> Result<CreateOutcome, ContentStoreError> {
        self.create_user_repo(creds, name, private).await
    }

    async fn list_repositories(
        &self,
        creds: &Credentials,
    ) -> Result<Vec<Repository>, ContentStoreError> {
        self.list_user_repos(creds).await
    }

    async fn get_repository(
        &self,
        creds: &Credentials,
        repo: &QualifiedName,
    ) -> Result<Option<Repository>, ContentStoreError> {
        self.get_repo(creds, repo).await
    }

    async fn authenticated_login(&self, creds: &Credentials) -> Result<String, ContentStoreError> {
        self.get_authenticated_user(creds).await
    }
}
