//! # Sync Subcommand
//!
//! Runs the pipeline once and reports what it did.

use anyhow::{Context, Result};
use clap::Args;
use pieceline_sync::{SyncConfig, SyncPipeline, SyncSummary};

/// Arguments for the `pieceline sync` subcommand.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Fetch and write the version even if it is already archived.
    #[arg(long)]
    pub force: bool,

    /// Print the full run summary as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Execute the sync subcommand.
pub async fn run_sync(args: &SyncArgs, config: SyncConfig) -> Result<u8> {
    let artifact_id = config.artifact_id.clone();
    let pipeline = SyncPipeline::open(config)
        .await
        .context("failed to set up sync pipeline")?;

    let summary = pipeline
        .run(args.force)
        .await
        .map_err(|e| anyhow::anyhow!("sync failed ({}): {e}", e.kind()))?;
    pipeline.archive().close().await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", describe(&artifact_id, &summary));
    }
    Ok(0)
}

fn describe(artifact_id: &str, summary: &SyncSummary) -> String {
    if summary.skipped {
        format!(
            "SKIPPED: {artifact_id} {} already archived at {}",
            summary.version, summary.output_dir
        )
    } else {
        format!(
            "OK: {artifact_id} {} wrote {} files ({} bytes) to {}",
            summary.version,
            summary.files_written.len(),
            summary.merged_pieces_size,
            summary.output_dir
        )
    }
}
