//! # Application Error
//!
//! Maps pipeline and archive failures to structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use pieceline_archive::ArchiveError;
use pieceline_sync::SyncError;
use thiserror::Error;

/// Application-level error type that maps to HTTP responses.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    /// An upstream distribution server failed or refused a request.
    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// A pipeline stage failed. `kind` names the stage.
    #[error("{kind} error: {message}")]
    Pipeline { kind: &'static str, message: String },
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Upstream(_) => "fetch",
            AppError::Unavailable(_) => "unavailable",
            AppError::Pipeline { kind, .. } => *kind,
        }
    }
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        tracing::error!(kind = err.kind(), "sync failed: {err}");
        if err.is_upstream() {
            AppError::Upstream(err.to_string())
        } else {
            AppError::Pipeline {
                kind: err.kind(),
                message: err.to_string(),
            }
        }
    }
}

impl From<ArchiveError> for AppError {
    fn from(err: ArchiveError) -> Self {
        AppError::Pipeline {
            kind: "archive",
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Pipeline { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({
            "error": {
                "code": status.as_u16(),
                "kind": self.kind(),
                "message": self.to_string(),
            }
        });
        (status, axum::Json(body)).into_response()
    }
}
