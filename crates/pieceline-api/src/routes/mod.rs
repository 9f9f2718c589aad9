//! # API Route Modules
//!
//! - `sync`: trigger a pipeline run, or resolve the chain without
//!   downloading pieces.
//! - `archive`: read-only queries against the archive index.

pub mod archive;
pub mod sync;
