//! # pieceline-api: HTTP Trigger for the Sync Pipeline
//!
//! A thin Axum surface over [`pieceline_sync::SyncPipeline`] and the
//! archive index. It adds no pipeline behavior of its own.
//!
//! ## API Surface
//!
//! | Route                                   | Module              | Purpose                       |
//! |-----------------------------------------|---------------------|-------------------------------|
//! | `POST /v1/sync?force=bool`              | [`routes::sync`]    | Run the pipeline once         |
//! | `GET /v1/inspect`                       | [`routes::sync`]    | Decoded chain documents only  |
//! | `GET /v1/archive/:binary_id/latest`     | [`routes::archive`] | Newest archived version       |
//! | `GET /v1/archive/:binary_id/versions`   | [`routes::archive`] | All archived versions         |
//! | `GET /health/liveness`, `/health/readiness` | this module     | Probes                        |
//!
//! Sync runs are serialized through a single lock in [`state::AppState`];
//! reads never wait on it.

pub mod error;
pub mod routes;
pub mod state;

use std::net::SocketAddr;

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::error::AppError;
use crate::state::AppState;

/// Assemble the application router.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::sync::router())
        .merge(routes::archive::router());

    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness));

    Router::new()
        .merge(health)
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "pieceline API listening");
    axum::serve(listener, app(state)).await
}

/// Liveness probe: 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once the archive store answers queries.
async fn readiness(State(state): State<AppState>) -> Result<&'static str, AppError> {
    state
        .pipeline
        .archive()
        .ping()
        .await
        .map_err(|e| AppError::Unavailable(e.to_string()))?;
    Ok("ready")
}
