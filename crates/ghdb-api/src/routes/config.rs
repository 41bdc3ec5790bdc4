//! Service config read and compare-and-swap update.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use ghdb_core::ConfigDocument;

use crate::auth::Caller;
use crate::error::AppError;
use crate::extractors::extract_json;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/config", get(read_config).put(update_config))
}

/// GET /api/config
async fn read_config(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<ConfigDocument>, AppError> {
    Ok(Json(state.config_store.read(caller.credentials()).await?))
}

/// PUT /api/config: replace the document. A concurrent edit since the
/// server's read is a 409; the caller re-reads and retries.
async fn update_config(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<ConfigDocument>, JsonRejection>,
) -> Result<Json<ConfigDocument>, AppError> {
    let doc = extract_json(body)?;
    let written = state.config_store.update(caller.credentials(), doc).await?;
    Ok(Json(written))
}
