//! Session lifecycle: initialize, inspect, log out.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use ghdb_state::{AuthState, InitSnapshot};

use crate::auth::Caller;
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/init", post(init))
        .route("/api/logout", post(logout))
        .route("/api/session", get(session))
}

/// POST /api/init: initialize the caller's service entity and return the
/// config with its connected repositories. Concurrent calls for one login
/// share a single initialization.
async fn init(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<InitSnapshot>, AppError> {
    let coordinator = state.sessions.coordinator(caller.login());
    let snapshot = coordinator.start(caller.0).await?;
    Ok(Json(snapshot))
}

/// POST /api/logout
async fn logout(State(state): State<AppState>, caller: Caller) -> StatusCode {
    state.sessions.logout(caller.login());
    tracing::info!(login = caller.login(), "session reset");
    StatusCode::NO_CONTENT
}

/// GET /api/session
async fn session(State(state): State<AppState>, caller: Caller) -> Json<AuthState> {
    Json(state.sessions.state(caller.login()))
}
