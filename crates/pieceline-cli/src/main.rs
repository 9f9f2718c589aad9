//! # pieceline CLI entry point
//!
//! Parses command-line arguments, initializes logging, and dispatches to
//! subcommand handlers on a Tokio runtime.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pieceline_cli::archive::{run_archive, ArchiveArgs};
use pieceline_cli::inspect::{run_inspect, InspectArgs};
use pieceline_cli::serve::{run_serve, ServeArgs};
use pieceline_cli::sync::{run_sync, SyncArgs};
use pieceline_cli::{build_config, GlobalOptions};

/// pieceline: fetch, reassemble, and archive piece-addressed distributions.
#[derive(Parser, Debug)]
#[command(name = "pieceline", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Materialize the current version and record it in the archive.
    Sync(SyncArgs),

    /// Print the decoded bootstrap, catalog, and manifest documents.
    Inspect(InspectArgs),

    /// Query or purge the archive index.
    Archive(ArchiveArgs),

    /// Run the HTTP trigger.
    Serve(ServeArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    tracing::debug!("pieceline CLI v{} starting", env!("CARGO_PKG_VERSION"));

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("failed to start async runtime: {e}");
            return ExitCode::from(1);
        }
    };

    let result = runtime.block_on(async {
        let config = build_config(&cli.global)?;
        match &cli.command {
            Commands::Sync(args) => run_sync(args, config).await,
            Commands::Inspect(args) => run_inspect(args, config).await,
            Commands::Archive(args) => run_archive(args, &config).await,
            Commands::Serve(args) => run_serve(args, config).await,
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
