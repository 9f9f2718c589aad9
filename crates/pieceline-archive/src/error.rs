//! Error types for the archive index.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while opening or querying the archive store.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("failed to open archive store at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("failed to apply archive schema: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("archive query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("failed to prepare archive directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unreadable date_pushed {value:?} on row {id}")]
    Timestamp { id: i64, value: String },
}
