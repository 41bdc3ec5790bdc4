//! # Link Resolution
//!
//! `GET /f/{token}` decodes a link token with the server key alone and
//! streams the target file back with long-lived cache headers. The
//! upstream body is forwarded chunk by chunk, never buffered whole. No
//! store read happens: a token resolves even if its mapping was never
//! recorded.
//!
//! The fetch carries no credentials, so links into private repositories
//! come back 404.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use ghdb_core::sanitize_filename;

use crate::error::AppError;
use crate::state::AppState;

const CACHE_FOREVER: &str = "public, max-age=31536000, immutable";
const PRIVATE_REPO_HINT: &str =
    "File not found. If this is a private repository, you need to make it public for CDN functionality.";

pub fn router() -> Router<AppState> {
    Router::new().route("/f/{token}", get(resolve))
}

/// GET /f/{token}
async fn resolve(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    let url = state.cipher.decode(&token)?;
    if !url.starts_with(&state.config.raw_url_prefix) {
        tracing::warn!("link token decoded to a URL outside the raw prefix");
        return Err(AppError::BadRequest("Invalid file identifier".into()));
    }

    let upstream = fetch(&state.http, &url).await?;
    let upstream_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let length = upstream.content_length();
    let filename = filename_for(&url);
    let content_type = content_type_for(&filename, upstream_type.as_deref());

    let mut response = (
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, CACHE_FOREVER.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{filename}\""),
            ),
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*".to_string()),
        ],
        Body::from_stream(upstream.bytes_stream()),
    )
        .into_response();
    if let Some(length) = length {
        response
            .headers_mut()
            .insert(header::CONTENT_LENGTH, length.into());
    }
    Ok(response)
}

/// Send the upstream request and check its status. The body is left
/// unread.
async fn fetch(http: &reqwest::Client, url: &str) -> Result<reqwest::Response, AppError> {
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| AppError::Upstream(format!("fetching linked file: {e}")))?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(PRIVATE_REPO_HINT.into()));
    }
    if !status.is_success() {
        return Err(AppError::Fetch(status.as_u16()));
    }
    Ok(response)
}

/// Last path segment of the URL, safe for a header.
fn filename_for(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let name = sanitize_filename(path.rsplit('/').next().unwrap_or_default());
    if name.is_empty() {
        "file".to_string()
    } else {
        name
    }
}

/// The upstream content type, unless it is generic, in which case the
/// file extension decides.
fn content_type_for(filename: &str, upstream: Option<&str>) -> String {
    let upstream = upstream.unwrap_or("application/octet-stream");
    let essence = upstream.split(';').next().unwrap_or_default().trim();
    if essence != "application/octet-stream" && essence != "text/plain" {
        return upstream.to_string();
    }
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match by_extension(&ext) {
        Some(guess) => guess.to_string(),
        None => upstream.to_string(),
    }
}

fn by_extension(ext: &str) -> Option<&'static str> {
    Some(match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "txt" => "text/plain",
        "html" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "ts" => "application/typescript",
        "md" => "text/markdown",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "zip" => "application/zip",
        "tar" => "application/x-tar",
        "gz" => "application/gzip",
        _ => return None,
    })
}
