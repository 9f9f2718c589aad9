//! # pieceline-sync: Pipeline Orchestration
//!
//! Drives one materialization run end to end:
//!
//! ```text
//! resolve chain ─▶ archive check ─▶ assemble pieces ─▶ partition files ─▶ record
//! ```
//!
//! ## Failure Semantics
//!
//! Every stage fails fast. The archive index is written only after the
//! partitioner has finished, so a failed run never marks a version as
//! materialized. Partitioning may leave some files on disk when a write
//! fails; the run still reports the failure.
//!
//! ## Idempotency
//!
//! A version already present in the archive is reported as skipped without
//! fetching any pieces, unless the caller forces a re-run.

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::SyncConfig;
pub use error::SyncError;
pub use pipeline::{Inspection, SyncPipeline, SyncSummary};
