//! # Application State
//!
//! Shared state handed to every handler through the `State` extractor.

use std::sync::Arc;

use pieceline_sync::SyncPipeline;
use tokio::sync::Mutex;

/// Server settings read at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind (default 8080).
    pub port: u16,
}

impl AppConfig {
    /// Read `PORT`, defaulting to 8080.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        Self { port }
    }
}

/// Cloneable handle shared by all routes.
#[derive(Debug, Clone)]
pub struct AppState {
    pub pipeline: Arc<SyncPipeline>,
    /// Held for the duration of a sync run. Two runs writing the same
    /// version directory must not interleave.
    pub run_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(pipeline: SyncPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            run_lock: Arc::new(Mutex::new(())),
        }
    }
}
