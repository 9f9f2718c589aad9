//! # Serve Subcommand
//!
//! Runs the HTTP trigger in the foreground.

use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use clap::Args;
use pieceline_api::state::AppState;
use pieceline_sync::{SyncConfig, SyncPipeline};

/// Arguments for the `pieceline serve` subcommand.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Port to listen on.
    #[arg(long, short, default_value_t = 8080)]
    pub port: u16,
}

/// Execute the serve subcommand. Returns only on error or shutdown.
pub async fn run_serve(args: &ServeArgs, config: SyncConfig) -> Result<u8> {
    let pipeline = SyncPipeline::open(config)
        .await
        .context("failed to set up sync pipeline")?;
    let addr = SocketAddr::new(args.bind, args.port);
    pieceline_api::serve(AppState::new(pipeline), addr)
        .await
        .with_context(|| format!("server on {addr} failed"))?;
    Ok(0)
}
