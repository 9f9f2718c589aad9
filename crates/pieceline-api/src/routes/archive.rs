//! # Archive Query API
//!
//! Read-only views over the archive index. Purging is left to the CLI.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use pieceline_archive::ArchiveRecord;
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

/// Response for the versions listing.
#[derive(Debug, Serialize)]
pub struct VersionsResponse {
    pub binary_id: String,
    pub count: usize,
    pub versions: Vec<ArchiveRecord>,
}

/// Build the archive router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/archive/:binary_id/latest", get(latest))
        .route("/v1/archive/:binary_id/versions", get(versions))
}

/// GET /v1/archive/:binary_id/latest: Most recently archived version.
async fn latest(
    State(state): State<AppState>,
    Path(binary_id): Path<String>,
) -> Result<Json<ArchiveRecord>, AppError> {
    state
        .pipeline
        .archive()
        .latest(&binary_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no archived versions of {binary_id}")))
}

/// GET /v1/archive/:binary_id/versions: Every archived version, newest first.
async fn versions(
    State(state): State<AppState>,
    Path(binary_id): Path<String>,
) -> Result<Json<VersionsResponse>, AppError> {
    let versions = state.pipeline.archive().all_versions(&binary_id).await?;
    Ok(Json(VersionsResponse {
        count: versions.len(),
        binary_id,
        versions,
    }))
}
