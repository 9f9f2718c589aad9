//! # pieceline-cli: Command-Line Interface
//!
//! Provides the `pieceline` binary.
//!
//! ## Subcommands
//!
//! - `pieceline sync`: resolve, assemble, partition, and archive the
//!   current version. Skips versions already archived unless `--force`.
//! - `pieceline inspect`: print the decoded chain documents.
//! - `pieceline archive`: `latest`, `versions`, and `purge` against the
//!   archive index.
//! - `pieceline serve`: run the HTTP trigger.
//!
//! ## Configuration
//!
//! Settings load from the `PIECELINE_*` environment variables first; any
//! global flag given on the command line wins:
//!
//! ```bash
//! pieceline --output-dir ./out --exclude discord sync
//! pieceline archive purge --older-than 2024-01-01T00:00:00Z
//! ```

pub mod archive;
pub mod inspect;
pub mod serve;
pub mod sync;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use pieceline_client::ClientConfig;
use pieceline_core::{ExclusionRule, PathTemplate};
use pieceline_sync::SyncConfig;
use url::Url;

/// Flags shared by every subcommand. Each overrides its environment
/// variable when present.
#[derive(Args, Debug, Default, Clone)]
pub struct GlobalOptions {
    /// Bootstrap token URL.
    #[arg(long, global = true, value_name = "URL")]
    pub bootstrap_url: Option<String>,

    /// Catalog URL template; `{id}` is the environment id.
    #[arg(long, global = true, value_name = "TEMPLATE")]
    pub catalog_template: Option<String>,

    /// Identifier recorded in the archive and used for output paths.
    #[arg(long, global = true)]
    pub artifact_id: Option<String>,

    /// Root directory for `<artifact>/<version>/` output.
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Archive database file.
    #[arg(long, global = true, value_name = "FILE")]
    pub archive_db: Option<PathBuf>,

    /// Skip file table entries whose names contain any of these substrings.
    #[arg(long, global = true, value_delimiter = ',', value_name = "SUBSTR")]
    pub exclude: Vec<String>,

    /// Maximum pieces fetched at once.
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Keep `http://` piece base URLs instead of upgrading them to https.
    #[arg(long, global = true)]
    pub no_upgrade: bool,
}

/// Load configuration from the environment and apply `opts` on top.
pub fn build_config(opts: &GlobalOptions) -> Result<SyncConfig> {
    let mut config = SyncConfig::from_env().context("invalid PIECELINE_* environment")?;
    apply_overrides(&mut config, opts)?;
    Ok(config)
}

/// Apply command-line overrides to an existing configuration.
pub fn apply_overrides(config: &mut SyncConfig, opts: &GlobalOptions) -> Result<()> {
    if opts.bootstrap_url.is_some() || opts.catalog_template.is_some() {
        let url = match &opts.bootstrap_url {
            Some(raw) => Url::parse(raw).with_context(|| format!("invalid --bootstrap-url {raw:?}"))?,
            None => config.client.bootstrap_url.clone(),
        };
        let template = match &opts.catalog_template {
            Some(raw) => PathTemplate::parse(raw)
                .with_context(|| format!("invalid --catalog-template {raw:?}"))?,
            None => config.client.catalog_template.clone(),
        };
        let checked = ClientConfig::new(url, template)?;
        config.client.bootstrap_url = checked.bootstrap_url;
        config.client.catalog_template = checked.catalog_template;
    }

    if let Some(id) = &opts.artifact_id {
        config.artifact_id = id.clone();
    }
    if let Some(dir) = &opts.output_dir {
        config.output_root = dir.clone();
    }
    if let Some(db) = &opts.archive_db {
        config.archive_db = db.clone();
    }
    if !opts.exclude.is_empty() {
        config.exclude = ExclusionRule::new(&opts.exclude);
    }
    if let Some(n) = opts.concurrency {
        config.client.concurrency = n.max(1);
    }
    if let Some(secs) = opts.timeout {
        config.client.timeout_secs = secs;
    }
    if opts.no_upgrade {
        config.client.upgrade_insecure = false;
    }
    Ok(())
}
