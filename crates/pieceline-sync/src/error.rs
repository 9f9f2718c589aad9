//! Top-level pipeline error.

use pieceline_archive::ArchiveError;
use pieceline_client::ClientError;
use pieceline_core::PartitionError;
use thiserror::Error;

/// Any failure that aborts a sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("partition failed: {0}")]
    Partition(#[from] PartitionError),

    #[error("archive failed: {0}")]
    Archive(#[from] ArchiveError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("pipeline worker failed: {0}")]
    Worker(String),
}

impl SyncError {
    /// Stable, lowercase name of the failing stage.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Client(e) => e.kind(),
            Self::Partition(_) => "partition",
            Self::Archive(_) => "archive",
            Self::Io { .. } => "io",
            Self::Worker(_) => "internal",
        }
    }

    /// Whether the run failed because an upstream server misbehaved.
    pub fn is_upstream(&self) -> bool {
        matches!(self, Self::Client(ClientError::Fetch(_)))
    }
}
