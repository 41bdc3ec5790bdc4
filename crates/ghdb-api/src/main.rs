//! # ghdb-api: Binary Entry Point
//!
//! Starts the Axum HTTP server over the GitHub content store.

use std::sync::Arc;

use ghdb_api::state::{AppConfig, AppState};
use ghdb_github::{GithubClient, GithubConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("GHDB_LOG_JSON").is_ok_and(|v| v.eq_ignore_ascii_case("true"));
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("configuration error: {e}");
        e
    })?;
    let github = GithubClient::new(GithubConfig::from_env()?)?;
    tracing::info!(?config, "configuration loaded");

    let port = config.port;
    let state = AppState::new(config, Arc::new(github))?;
    let app = ghdb_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("ghdb API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
