//! Contents API: `/repos/{owner}/{repo}/contents/{path}`.
//!
//! | Method | Status                  | Outcome                      |
//! |--------|-------------------------|------------------------------|
//! | GET    | 200 file                | `StoredFile`                 |
//! | GET    | 200 array / non-file    | `NotAFile`                   |
//! | PUT    | 201 / 200               | `Created` / `Replaced`       |
//! | PUT    | 409                     | `Conflict` (stale sha)       |
//! | PUT    | 422 without sha         | `Conflict` (file exists)     |
//! | DELETE | 200                     | `Deleted`                    |
//! | DELETE | 409 / 422               | `Conflict`                   |

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ghdb_core::{QualifiedName, RevisionTag};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};

use crate::client::{status_error, GithubClient, COMMITTER_NAME};
use crate::credentials::Credentials;
use crate::error::ContentStoreError;
use crate::store::{DeleteOutcome, FileWrite, StoredFile, WriteOutcome};

/// Body of a contents GET: a single entry, or a directory listing.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsBody {
    Entry(ContentEntry),
    Listing(Vec<serde::de::IgnoredAny>),
}

#[derive(Debug, Deserialize)]
struct ContentEntry {
    #[serde(rename = "type")]
    kind: String,
    sha: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
    #[serde(default)]
    download_url: Option<String>,
}

#[derive(Debug, Serialize)]
struct Committer<'a> {
    name: &'a str,
    email: String,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    committer: Committer<'a>,
}

#[derive(Debug, Serialize)]
struct DeleteContentsRequest<'a> {
    message: &'a str,
    sha: &'a str,
    committer: Committer<'a>,
}

#[derive(Debug, Deserialize)]
struct PutContentsResponse {
    content: WrittenEntry,
}

#[derive(Debug, Deserialize)]
struct WrittenEntry {
    sha: String,
}

fn committer(creds: &Credentials) -> Committer<'static> {
    Committer {
        name: COMMITTER_NAME,
        email: creds.committer_email(),
    }
}

/// Decode the API's line-wrapped base64.
fn decode_content(endpoint: &str, encoded: &str) -> Result<Vec<u8>, ContentStoreError> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(compact)
        .map_err(|e| ContentStoreError::Encoding {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
}

fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

impl GithubClient {
    fn contents_url(&self, repo: &QualifiedName, path: &str) -> Result<url::Url, ContentStoreError> {
        self.endpoint_url(
            ["repos", repo.owner(), repo.name(), "contents"]
                .into_iter()
                .chain(path_segments(path)),
        )
    }

    /// Calls `GET /repos/{owner}/{repo}/contents/{path}`.
    pub(crate) async fn get_contents(
        &self,
        creds: &Credentials,
        repo: &QualifiedName,
        path: &str,
    ) -> Result<StoredFile, ContentStoreError> {
        let endpoint = format!("GET /repos/{repo}/contents/{path}");
        let url = self.contents_url(repo, path)?;
        let resp = self
            .send(&endpoint, self.request(Method::GET, url, creds)?)
            .await?;

        if !resp.status().is_success() {
            return Err(status_error(&endpoint, resp).await);
        }

        let body: ContentsBody =
            resp.json()
                .await
                .map_err(|e| ContentStoreError::Deserialization {
                    endpoint: endpoint.clone(),
                    source: e,
                })?;

        let entry = match body {
            ContentsBody::Entry(entry) if entry.kind == "file" => entry,
            _ => {
                return Err(ContentStoreError::NotAFile {
                    path: path.to_string(),
                })
            }
        };

        if entry.encoding.as_deref() == Some("none") {
            return Err(ContentStoreError::Encoding {
                endpoint,
                reason: "file too large for the contents API".into(),
            });
        }

        let content = match entry.content.as_deref() {
            Some(encoded) => decode_content(&endpoint, encoded)?,
            None => Vec::new(),
        };

        Ok(StoredFile {
            content,
            revision: RevisionTag::new(entry.sha),
            download_url: entry.download_url,
        })
    }

    /// Calls `PUT /repos/{owner}/{repo}/contents/{path}`.
    pub(crate) async fn put_contents(
        &self,
        creds: &Credentials,
        repo: &QualifiedName,
        path: &str,
        write: FileWrite,
    ) -> Result<WriteOutcome, ContentStoreError> {
        let endpoint = format!("PUT /repos/{repo}/contents/{path}");
        let url = self.contents_url(repo, path)?;
        let body = PutContentsRequest {
            message: &write.message,
            content: STANDARD.encode(&write.content),
            sha: write.revision.as_ref().map(RevisionTag::as_str),
            committer: committer(creds),
        };

        let resp = self
            .send(&endpoint, self.request(Method::PUT, url, creds)?.json(&body))
            .await?;

        let status = resp.status();
        let created = match status {
            StatusCode::CREATED => true,
            StatusCode::OK => false,
            StatusCode::CONFLICT => {
                tracing::debug!(%repo, path, "write rejected: stale revision");
                return Ok(WriteOutcome::Conflict);
            }
            StatusCode::UNPROCESSABLE_ENTITY if write.revision.is_none() => {
                tracing::debug!(%repo, path, "create rejected: file exists");
                return Ok(WriteOutcome::Conflict);
            }
            _ => return Err(status_error(&endpoint, resp).await),
        };

        let written: PutContentsResponse =
            resp.json()
                .await
                .map_err(|e| ContentStoreError::Deserialization {
                    endpoint,
                    source: e,
                })?;
        let revision = RevisionTag::new(written.content.sha);
        Ok(if created {
            WriteOutcome::Created(revision)
        } else {
            WriteOutcome::Replaced(revision)
        })
    }

    /// Calls `DELETE /repos/{owner}/{repo}/contents/{path}`.
    pub(crate) async fn delete_contents(
        &self,
        creds: &Credentials,
        repo: &QualifiedName,
        path: &str,
        revision: &RevisionTag,
        message: &str,
    ) -> Result<DeleteOutcome, ContentStoreError> {
        let endpoint = format!("DELETE /repos/{repo}/contents/{path}");
        let url = self.contents_url(repo, path)?;
        let body = DeleteContentsRequest {
            message,
            sha: revision.as_str(),
            committer: committer(creds),
        };

        let resp = self
            .send(
                &endpoint,
                self.request(Method::DELETE, url, creds)?.json(&body),
            )
            .await?;

        match resp.status() {
            s if s.is_success() => Ok(DeleteOutcome::Deleted),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => Ok(DeleteOutcome::Conflict),
            _ => Err(status_error(&endpoint, resp).await),
        }
    }
}
