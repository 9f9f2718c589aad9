//! # Inspect Subcommand
//!
//! Resolves the chain and prints the three decoded documents. No pieces are
//! downloaded and nothing is written.

use anyhow::{Context, Result};
use clap::Args;
use pieceline_client::PiecelineClient;
use pieceline_sync::{Inspection, SyncConfig};

/// Arguments for the `pieceline inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Print only the manifest document.
    #[arg(long)]
    pub manifest_only: bool,
}

/// Execute the inspect subcommand.
pub async fn run_inspect(args: &InspectArgs, config: SyncConfig) -> Result<u8> {
    let client = PiecelineClient::new(config.client).context("failed to build client")?;
    let res = client
        .resolve()
        .await
        .map_err(|e| anyhow::anyhow!("resolution failed ({}): {e}", e.kind()))?;

    let out = if args.manifest_only {
        serde_json::to_string_pretty(&res.manifest)?
    } else {
        serde_json::to_string_pretty(&Inspection {
            base: res.bootstrap,
            catalog: res.catalog,
            manifest: res.manifest,
        })?
    };
    println!("{out}");
    Ok(0)
}
