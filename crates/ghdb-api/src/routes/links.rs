//! Masked file links: issue and list.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use ghdb_core::{sanitize_path, MappingDocument};
use ghdb_store::NewMapping;
use serde::{Deserialize, Serialize};

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::{extract_validated_json, Validate};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/file-link", post(create_link))
        .route("/api/file-links", get(list_links))
}

/// Request body for POST /api/file-link.
#[derive(Debug, Deserialize)]
pub struct FileLinkRequest {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub sha: String,
    #[serde(default)]
    pub download_url: String,
}

impl Validate for FileLinkRequest {
    fn validate(&self) -> Result<(), String> {
        let fields = [
            &self.owner,
            &self.repo,
            &self.sha,
            &self.download_url,
        ];
        if fields.iter().any(|f| f.trim().is_empty()) || sanitize_path(&self.path).is_empty() {
            return Err("Missing required fields".into());
        }
        Ok(())
    }
}

/// Response body for POST /api/file-link.
#[derive(Debug, Serialize, Deserialize)]
pub struct FileLinkResponse {
    /// The link token.
    pub uuid: String,
    /// Public URL that resolves the token.
    pub url: String,
}

/// POST /api/file-link: issue a token for a file's download URL and record
/// it in the caller's mapping index. Recording is best effort.
async fn create_link(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<FileLinkRequest>, JsonRejection>,
) -> Result<Json<FileLinkResponse>, AppError> {
    let req = extract_validated_json(body)?;
    let mapping = NewMapping {
        owner: req.owner.trim().to_string(),
        repo: req.repo.trim().to_string(),
        path: sanitize_path(&req.path),
        sha: req.sha.trim().to_string(),
        download_url: req.download_url.trim().to_string(),
    };

    let token = state
        .mappings
        .add_mapping(caller.credentials(), caller.login(), mapping, &state.cipher)
        .await?;

    Ok(Json(FileLinkResponse {
        url: state.config.link_url(&token),
        uuid: token,
    }))
}

/// GET /api/file-links: the caller's recorded links, keyed by token.
async fn list_links(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<MappingDocument>, AppError> {
    let index = state
        .mappings
        .get_all(caller.credentials(), caller.login())
        .await?;
    Ok(Json(index))
}
