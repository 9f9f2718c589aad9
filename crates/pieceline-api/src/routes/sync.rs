//! # Sync Trigger API

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use pieceline_sync::{Inspection, SyncSummary};
use serde::Deserialize;

use crate::error::AppError;
use crate::state::AppState;

/// Query parameters for `POST /v1/sync`.
#[derive(Debug, Default, Deserialize)]
pub struct SyncParams {
    /// Re-fetch even if the resolved version is already archived.
    #[serde(default)]
    pub force: bool,
}

/// Build the sync router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/sync", post(run_sync))
        .route("/v1/inspect", get(inspect))
}

/// POST /v1/sync: Resolve, assemble, partition, and archive.
async fn run_sync(
    State(state): State<AppState>,
    Query(params): Query<SyncParams>,
) -> Result<Json<SyncSummary>, AppError> {
    let _guard = state.run_lock.lock().await;
    tracing::info!(force = params.force, "sync requested");
    let summary = state.pipeline.run(params.force).await?;
    Ok(Json(summary))
}

/// GET /v1/inspect: The three decoded chain documents.
async fn inspect(State(state): State<AppState>) -> Result<Json<Inspection>, AppError> {
    Ok(Json(state.pipeline.inspect().await?))
}
