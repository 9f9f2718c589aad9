//! # pieceline-archive: Archive Index
//!
//! Records which `(binary_id, version)` pairs have been materialized on disk
//! and where. The index is the only mutable state the pipeline shares across
//! runs; everything else is a function of the remote chain.
//!
//! ## Contract
//!
//! - `record` is insert-or-ignore on the unique pair. A duplicate is a
//!   silent no-op, reported as `false`.
//! - `latest` and `all_versions` order by push time, newest first, with
//!   insertion order breaking ties.
//! - `purge_older_than` deletes rows strictly older than the threshold and
//!   never touches files on disk.
//!
//! ## Storage
//!
//! SQLite via `sqlx`. File-backed stores run in WAL mode with a busy
//! timeout so concurrent runs for different artifacts serialize their
//! inserts. The schema is applied on open from the embedded migrations.

pub mod error;
pub mod index;
pub mod record;

pub use error::ArchiveError;
pub use index::ArchiveIndex;
pub use record::ArchiveRecord;
