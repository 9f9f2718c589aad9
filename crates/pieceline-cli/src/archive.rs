//! # Archive Subcommand
//!
//! Queries and retention against the archive index. Purging removes index
//! rows only; files on disk are left alone.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use pieceline_archive::{ArchiveIndex, ArchiveRecord};
use pieceline_sync::SyncConfig;

/// Arguments for the `pieceline archive` subcommand.
#[derive(Args, Debug)]
pub struct ArchiveArgs {
    #[command(subcommand)]
    pub command: ArchiveCommand,
}

/// Archive subcommands.
#[derive(Subcommand, Debug)]
pub enum ArchiveCommand {
    /// Show the most recently archived version.
    Latest {
        /// Artifact identifier (defaults to the configured artifact).
        binary_id: Option<String>,
    },

    /// List every archived version, newest first.
    Versions {
        /// Artifact identifier (defaults to the configured artifact).
        binary_id: Option<String>,
    },

    /// Delete records pushed before a point in time.
    Purge {
        /// RFC 3339 threshold, e.g. `2024-01-01T00:00:00Z`.
        #[arg(long, value_name = "TIMESTAMP")]
        older_than: String,
    },
}

/// Execute the archive subcommand.
pub async fn run_archive(args: &ArchiveArgs, config: &SyncConfig) -> Result<u8> {
    let index = ArchiveIndex::open(&config.archive_db)
        .await
        .with_context(|| format!("failed to open archive {}", config.archive_db.display()))?;

    let code = match &args.command {
        ArchiveCommand::Latest { binary_id } => {
            let id = binary_id.as_deref().unwrap_or(&config.artifact_id);
            cmd_latest(&index, id).await?
        }
        ArchiveCommand::Versions { binary_id } => {
            let id = binary_id.as_deref().unwrap_or(&config.artifact_id);
            cmd_versions(&index, id).await?
        }
        ArchiveCommand::Purge { older_than } => cmd_purge(&index, older_than).await?,
    };

    index.close().await;
    Ok(code)
}

async fn cmd_latest(index: &ArchiveIndex, binary_id: &str) -> Result<u8> {
    match index.latest(binary_id).await? {
        Some(record) => {
            println!("{}", format_record(&record));
            Ok(0)
        }
        None => {
            println!("NOT FOUND: no archived versions of {binary_id}");
            Ok(1)
        }
    }
}

async fn cmd_versions(index: &ArchiveIndex, binary_id: &str) -> Result<u8> {
    let records = index.all_versions(binary_id).await?;
    for record in &records {
        println!("{}", format_record(record));
    }
    tracing::info!(binary_id, count = records.len(), "listed archived versions");
    Ok(0)
}

async fn cmd_purge(index: &ArchiveIndex, older_than: &str) -> Result<u8> {
    let threshold = parse_threshold(older_than)?;
    let removed = index.purge_older_than(threshold).await?;
    println!("OK: purged {removed} records older than {}", threshold.to_rfc3339());
    Ok(0)
}

/// Parse an RFC 3339 timestamp into UTC.
pub fn parse_threshold(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .with_context(|| format!("invalid --older-than {raw:?}: expected RFC 3339"))
}

fn format_record(record: &ArchiveRecord) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        record.binary_id,
        record.version,
        record.date_pushed.to_rfc3339(),
        record.path
    )
}
