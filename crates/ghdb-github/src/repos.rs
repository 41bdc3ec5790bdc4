//! Repository and account endpoints.
//!
//! | Method | Path                   | Operation             |
//! |--------|------------------------|-----------------------|
//! | GET    | `/user`                | `authenticated_login` |
//! | POST   | `/user/repos`          | `create_repository`   |
//! | GET    | `/user/repos`          | `list_repositories`   |
//! | GET    | `/repos/{owner}/{repo}`| `get_repository`      |

use ghdb_core::QualifiedName;
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::client::{status_error, GithubClient};
use crate::credentials::Credentials;
use crate::error::ContentStoreError;
use crate::store::{CreateOutcome, Repository};

/// Page size for repository listing (the API maximum).
const PER_PAGE: usize = 100;

#[derive(Debug, Serialize)]
struct CreateRepoRequest<'a> {
    name: &'a str,
    private: bool,
    /// Seed an initial commit so the contents API works immediately.
    auto_init: bool,
}

#[derive(Debug, Deserialize)]
struct AuthenticatedUser {
    login: String,
}

impl GithubClient {
    /// Calls `GET /user`. 401 means the token is invalid or revoked.
    pub(crate) async fn get_authenticated_user(
        &self,
        creds: &Credentials,
    ) -> Result<String, ContentStoreError> {
        let endpoint = "GET /user";
        let url = self.endpoint_url(["user"])?;
        let resp = self
            .send(endpoint, self.request(Method::GET, url, creds)?)
            .await?;
        if !resp.status().is_success() {
            return Err(status_error(endpoint, resp).await);
        }

        let user: AuthenticatedUser =
            resp.json()
                .await
                .map_err(|e| ContentStoreError::Deserialization {
                    endpoint: endpoint.into(),
                    source: e,
                })?;
        Ok(user.login)
    }

    /// Calls `POST /user/repos`. 422 means the name is taken.
    pub(crate) async fn create_user_repo(
        &self,
        creds: &Credentials,
        name: &str,
        private: bool,
    ) -> Result<CreateOutcome, ContentStoreError> {
        let endpoint = "POST /user/repos";
        let url = self.endpoint_url(["user", "repos"])?;
        let body = CreateRepoRequest {
            name,
            private,
            auto_init: true,
        };

        let resp = self
            .send(endpoint, self.request(Method::POST, url, creds)?.json(&body))
            .await?;

        match resp.status() {
            StatusCode::UNPROCESSABLE_ENTITY => {
                tracing::debug!(name, "repository already exists");
                Ok(CreateOutcome::AlreadyExisted)
            }
            s if s.is_success() => {
                let repo: Repository =
                    resp.json()
                        .await
                        .map_err(|e| ContentStoreError::Deserialization {
                            endpoint: endpoint.into(),
                            source: e,
                        })?;
                tracing::info!(full_name = %repo.full_name, "created repository");
                Ok(CreateOutcome::Created(repo))
            }
            _ => Err(status_error(endpoint, resp).await),
        }
    }

    /// Calls `GET /user/repos?per_page=100&page={n}` until a short page.
    pub(crate) async fn list_user_repos(
        &self,
        creds: &Credentials,
    ) -> Result<Vec<Repository>, ContentStoreError> {
        let mut all = Vec::new();
        let mut page = 1u32;
        loop {
            let endpoint = format!("GET /user/repos?page={page}");
            let mut url = self.endpoint_url(["user", "repos"])?;
            url.query_pairs_mut()
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let resp = self
                .send(&endpoint, self.request(Method::GET, url, creds)?)
                .await?;
            if !resp.status().is_success() {
                return Err(status_error(&endpoint, resp).await);
            }

            let batch: Vec<Repository> =
                resp.json()
                    .await
                    .map_err(|e| ContentStoreError::Deserialization {
                        endpoint,
                        source: e,
                    })?;
            let done = batch.len() < PER_PAGE;
            all.extend(batch);
            if done {
                return Ok(all);
            }
            page += 1;
        }
    }

    /// Calls `GET /repos/{owner}/{repo}`. 404 is `None`.
    pub(crate) async fn get_repo(
        &self,
        creds: &Credentials,
        repo: &QualifiedName,
    ) -> Result<Option<Repository>, ContentStoreError> {
        let endpoint = format!("GET /repos/{repo}");
        let url = self.endpoint_url(["repos", repo.owner(), repo.name()])?;
        let resp = self
            .send(&endpoint, self.request(Method::GET, url, creds)?)
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(status_error(&endpoint, resp).await);
        }

        resp.json()
            .await
            .map(Some)
            .map_err(|e| ContentStoreError::Deserialization {
                endpoint,
                source: e,
            })
    }
}
