//! # pieceline-api: Binary Entry Point
//!
//! Starts the Axum HTTP server. Pipeline settings come from the
//! `PIECELINE_*` environment variables; the port from `PORT` (default 8080).

use pieceline_api::state::{AppConfig, AppState};
use pieceline_sync::{SyncConfig, SyncPipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let app_config = AppConfig::from_env();
    let sync_config = SyncConfig::from_env().map_err(|e| {
        tracing::error!("Invalid configuration: {e}");
        e
    })?;

    let pipeline = SyncPipeline::open(sync_config).await.map_err(|e| {
        tracing::error!("Failed to open pipeline: {e}");
        e
    })?;

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], app_config.port));
    pieceline_api::serve(AppState::new(pipeline), addr).await?;
    Ok(())
}
