//! # pieceline-core: Foundational Types for pieceline
//!
//! This crate holds everything in the pipeline that does not touch the
//! network: decoding indirection tokens, normalising piece digests,
//! validating the three hop documents into typed records, compiling remote
//! path templates, and partitioning an assembled byte stream into files.
//!
//! ## Pipeline Shape
//!
//! ```text
//! bootstrap token ──► catalog token ──► manifest token
//!        │                  │                 │
//!   Environment        Catalog/Remote      Manifest
//!                                         (digests, files)
//! ```
//!
//! The HTTP side lives in `pieceline-client`; persistence lives in
//! `pieceline-archive`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `pieceline-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod digest;
pub mod document;
pub mod error;
pub mod exclude;
pub mod partition;
pub mod template;
pub mod token;

// Re-export primary types for ergonomic imports.
pub use digest::PieceDigest;
pub use document::{Catalog, Environment, FileEntry, Manifest, RemoteBase};
pub use error::{DecodeError, DigestError, DocumentError, PartitionError, TemplateError};
pub use exclude::ExclusionRule;
pub use partition::{partition, PartitionOutcome};
pub use template::PathTemplate;
pub use token::IndirectionDocument;
