//! # ghdb-api: HTTP Service
//!
//! ## API Surface
//!
//! | Method | Path               | Module                  |
//! |--------|--------------------|-------------------------|
//! | GET    | `/health/liveness` | here                    |
//! | POST   | `/api/init`        | [`routes::session`]     |
//! | POST   | `/api/logout`      | [`routes::session`]     |
//! | GET    | `/api/session`     | [`routes::session`]     |
//! | GET    | `/api/config`      | [`routes::config`]      |
//! | PUT    | `/api/config`      | [`routes::config`]      |
//! | POST   | `/api/file-link`   | [`routes::links`]       |
//! | GET    | `/api/file-links`  | [`routes::links`]       |
//! | GET    | `/f/{token}`       | [`routes::resolve`]     |
//!
//! `/api/*` handlers act with the caller's GitHub credentials (see
//! [`auth`]); the claimed login must own the token. `/f/*` and the
//! health probe are open.

pub mod auth;
pub mod error;
pub mod extractors;
pub mod identity;
pub mod routes;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::session::router())
        .merge(routes::config::router())
        .merge(routes::links::router())
        .layer(DefaultBodyLimit::max(1024 * 1024));

    Router::new()
        .route("/health/liveness", get(liveness))
        .merge(api)
        .merge(routes::resolve::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health/liveness
async fn liveness() -> &'static str {
    "ok"
}
