//! Pipeline configuration: the client settings plus where results go.

use std::path::PathBuf;

use pieceline_client::{ClientConfig, ConfigError};
use pieceline_core::ExclusionRule;

/// Default artifact identifier used for archive rows and output paths.
pub const DEFAULT_ARTIFACT_ID: &str = "osrs";
/// Default root under which `<artifact_id>/<version>/` directories are made.
pub const DEFAULT_OUTPUT_DIR: &str = "./binaries";
/// Default archive database file.
pub const DEFAULT_ARCHIVE_DB: &str = "./binaries.db";

/// Configuration for a [`SyncPipeline`](crate::SyncPipeline).
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Distribution client settings.
    pub client: ClientConfig,
    /// Identifier recorded in the archive for this artifact.
    pub artifact_id: String,
    /// Root output directory.
    pub output_root: PathBuf,
    /// Archive database location.
    pub archive_db: PathBuf,
    /// File table entries to leave unwritten.
    pub exclude: ExclusionRule,
}

impl SyncConfig {
    /// Wrap a client configuration with default output settings.
    pub fn new(client: ClientConfig) -> Self {
        Self {
            client,
            artifact_id: DEFAULT_ARTIFACT_ID.to_string(),
            output_root: PathBuf::from(DEFAULT_OUTPUT_DIR),
            archive_db: PathBuf::from(DEFAULT_ARCHIVE_DB),
            exclude: ExclusionRule::none(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Reads everything [`ClientConfig::from_env`] reads, plus:
    /// - `PIECELINE_ARTIFACT_ID` (default: `osrs`)
    /// - `PIECELINE_OUTPUT_DIR` (default: `./binaries`)
    /// - `PIECELINE_ARCHIVE_DB` (default: `./binaries.db`)
    /// - `PIECELINE_EXCLUDE` (comma-separated name substrings, default: none)
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new(ClientConfig::from_env()?);
        if let Some(id) = env_non_empty("PIECELINE_ARTIFACT_ID") {
            config.artifact_id = id;
        }
        if let Some(dir) = env_non_empty("PIECELINE_OUTPUT_DIR") {
            config.output_root = PathBuf::from(dir);
        }
        if let Some(db) = env_non_empty("PIECELINE_ARCHIVE_DB") {
            config.archive_db = PathBuf::from(db);
        }
        if let Some(list) = env_non_empty("PIECELINE_EXCLUDE") {
            config.exclude = ExclusionRule::from_list(&list);
        }
        Ok(config)
    }

    /// Configuration for a local mock distribution, writing under `root`.
    pub fn local_mock(base: &str, root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let root = root.into();
        let mut config = Self::new(ClientConfig::local_mock(base)?);
        config.output_root = root.join("binaries");
        config.archive_db = root.join("binaries.db");
        Ok(config)
    }
}

fn env_non_empty(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
