//! Client error types.

use pieceline_core::{DecodeError, DigestError, DocumentError, TemplateError};

use crate::config::ConfigError;

/// Network failure at any hop or piece.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport error (connect, TLS, timeout).
    #[error("HTTP error fetching {url}: {source}")]
    Transport { url: String, source: reqwest::Error },
    /// The server answered with a non-2xx status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    /// The response body could not be read.
    #[error("failed to read response body from {url}: {source}")]
    Body { url: String, source: reqwest::Error },
}

impl FetchError {
    /// HTTP status code, when the failure was a status response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A piece body that does not inflate.
#[derive(Debug, thiserror::Error)]
pub enum DecompressError {
    /// Body shorter than the container header.
    #[error("piece {digest} is {len} bytes, shorter than its {header}-byte header")]
    Truncated {
        digest: String,
        len: usize,
        header: usize,
    },
    /// The deflate stream is corrupt.
    #[error("piece {digest} failed to inflate: {source}")]
    Inflate {
        digest: String,
        source: std::io::Error,
    },
}

/// Everything that can go wrong resolving the chain or assembling pieces.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Digest(#[from] DigestError),
    #[error("resolution failed: {0}")]
    Resolution(#[from] DocumentError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Decompress(#[from] DecompressError),
    /// A URL from a document or template did not parse.
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    /// Building the HTTP client failed.
    #[error("failed to build HTTP client: {0}")]
    ClientInit(#[source] reqwest::Error),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    /// A blocking inflate task panicked or was cancelled.
    #[error("piece worker failed: {0}")]
    Worker(String),
}

impl ClientError {
    /// Stable, lowercase name of the failing stage.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Digest(_) => "digest",
            Self::Resolution(_) => "resolution",
            Self::Template(_) => "template",
            Self::Fetch(_) => "fetch",
            Self::Decompress(_) => "decompress",
            Self::InvalidUrl { .. } => "resolution",
            Self::ClientInit(_) | Self::Config(_) => "config",
            Self::Worker(_) => "internal",
        }
    }
}
