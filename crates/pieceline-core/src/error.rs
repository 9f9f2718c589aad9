//! # Error Types
//!
//! One error enum per pipeline stage that lives in this crate. The network
//! stages (`FetchError`, `DecompressError`) live in `pieceline-client`.
//!
//! Every variant carries the value that failed (token segment count,
//! digest text, field path, entry name and offsets) so a failed run can be
//! diagnosed from the log line alone.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to extract a JSON payload from a compact token.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The token (or response body) was empty.
    #[error("no token provided")]
    Empty,

    /// The token did not have the three dot-separated segments.
    #[error("token has {0} segment(s), expected 3")]
    Segments(usize),

    /// The payload segment is not valid base64url.
    #[error("token payload is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The payload decoded but is not JSON.
    #[error("token payload is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    /// The payload is JSON but not an object.
    #[error("token payload is a JSON {0}, expected an object")]
    NotAnObject(&'static str),

    /// The response body looked like a JSON envelope but could not be parsed.
    #[error("response envelope is not valid JSON: {0}")]
    Envelope(#[source] serde_json::Error),

    /// The JSON envelope did not carry a token under the expected key.
    #[error("no token found under key \"{0}\"")]
    MissingEnvelopeKey(String),
}

/// Failure to normalise a piece digest.
#[derive(Error, Debug)]
pub enum DigestError {
    /// Empty digest text.
    #[error("digest is empty")]
    Empty,

    /// Not decodable as (URL-safe) base64.
    #[error("digest {digest:?} is not valid base64: {source}")]
    Base64 {
        /// The digest text as received.
        digest: String,
        /// Underlying decoder error.
        source: base64::DecodeError,
    },

    /// Hex form with an odd number of characters.
    #[error("hex digest has odd length: {0}")]
    OddLength(usize),

    /// Hex form with a non-hex character.
    #[error("invalid hex digest {0:?}")]
    InvalidHex(String),
}

/// A hop document is missing a field the next hop depends on.
///
/// This is the resolution failure of the chain walk: the document decoded
/// fine but does not describe where to go next.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// A required field is absent (dotted path, e.g. `environments.production.id`).
    #[error("{document} document is missing {field}")]
    MissingField {
        /// Which hop: `bootstrap`, `catalog`, or `manifest`.
        document: &'static str,
        /// Dotted path of the absent field.
        field: &'static str,
    },

    /// A field is present but its value cannot be used.
    #[error("{document} document has invalid {field}: {value:?}")]
    InvalidField {
        /// Which hop.
        document: &'static str,
        /// Dotted path of the field.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A field is present but has the wrong shape.
    #[error("{document} document is malformed: {source}")]
    Malformed {
        /// Which hop.
        document: &'static str,
        /// Deserialization failure.
        source: serde_json::Error,
    },
}

/// Failure to compile or render a path template.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TemplateError {
    /// A `{` without a matching `}` or a stray `}`.
    #[error("unbalanced brace at byte {position} in template {template:?}")]
    UnbalancedBrace {
        /// Template source.
        template: String,
        /// Byte offset of the offending brace.
        position: usize,
    },

    /// A placeholder that is neither `{Name}` nor `{SubString:start,end,{Name}}`.
    #[error("malformed placeholder {placeholder:?}: {reason}")]
    MalformedPlaceholder {
        /// The placeholder text between the outer braces.
        placeholder: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The template references a variable the caller did not supply.
    #[error("unresolved template variable {0:?}")]
    UnresolvedVariable(String),

    /// A substring range falls outside the variable's value.
    #[error("substring {start}..{end} is out of range for {name} (length {len})")]
    SubstringOutOfRange {
        /// Variable name.
        name: String,
        /// Range start.
        start: usize,
        /// Range end (exclusive).
        end: usize,
        /// Length of the supplied value.
        len: usize,
    },
}

/// Failure while partitioning the assembled buffer into files.
#[derive(Error, Debug)]
pub enum PartitionError {
    /// The file table does not describe exactly the assembled buffer.
    #[error("file table totals {table} bytes but the assembled buffer is {buffer} bytes")]
    SizeMismatch {
        /// Sum of all entry sizes.
        table: u64,
        /// Buffer length.
        buffer: u64,
    },

    /// An entry's byte range runs past the end of the buffer.
    #[error("entry {name:?} at offset {offset} with size {size} exceeds buffer length {len}")]
    OutOfBounds {
        /// Entry name.
        name: String,
        /// Running offset at the entry.
        offset: u64,
        /// Entry size.
        size: u64,
        /// Buffer length.
        len: u64,
    },

    /// An entry name would escape the output directory.
    #[error("unsafe output path {0:?}")]
    UnsafePath(String),

    /// Creating a directory or writing a file failed.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Path being created or written.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}
