//! # Piece Fetcher
//!
//! Pieces are addressed by digest under the catalog's remote base:
//!
//! ```text
//! {baseUrl}{pieceFormat rendered with TargetDigest = hex digest}
//! ```
//!
//! Each body carries a fixed 6-byte container header followed by a raw
//! deflate stream. Fetching a piece has no side effects beyond the request.

use std::io::Read;
use std::sync::Arc;

use flate2::read::DeflateDecoder;
use pieceline_core::{PathTemplate, PieceDigest, RemoteBase};
use url::Url;

use crate::error::{ClientError, DecompressError};
use crate::http::{parse_base_url, HttpFetcher};

/// Length of the container header preceding each piece's deflate stream.
pub const PIECE_HEADER_LEN: usize = 6;

/// Template variable bound to the piece's hex digest.
pub const TARGET_DIGEST_VAR: &str = "TargetDigest";

/// A compiled remote piece base: the function `hex digest -> piece URL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSource {
    base_url: Url,
    template: PathTemplate,
}

impl RemoteSource {
    /// Compile a catalog's remote base once per run.
    ///
    /// Fails if the base URL does not parse or the template references
    /// anything other than `TargetDigest`.
    pub fn compile(remote: &RemoteBase, upgrade_insecure: bool) -> Result<Self, ClientError> {
        let base_url = parse_base_url(&remote.base_url, upgrade_insecure)?;
        let template = PathTemplate::parse(&remote.piece_format)?;
        template.ensure_resolvable(&[TARGET_DIGEST_VAR])?;
        Ok(Self { base_url, template })
    }

    /// Base URL after TLS upgrade.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of the piece with the given digest.
    pub fn piece_url(&self, digest: &PieceDigest) -> Result<String, ClientError> {
        let path = self.template.render(&[(TARGET_DIGEST_VAR, digest.hex())])?;
        let base = self.base_url.as_str();
        Ok(match (base.ends_with('/'), path.starts_with('/')) {
            (true, true) => format!("{base}{}", &path[1..]),
            (false, false) => format!("{base}/{path}"),
            _ => format!("{base}{path}"),
        })
    }
}

/// Strip the container header and inflate a piece body.
pub fn inflate_piece(digest: &PieceDigest, body: &[u8]) -> Result<Vec<u8>, DecompressError> {
    let payload = body
        .get(PIECE_HEADER_LEN..)
        .ok_or_else(|| DecompressError::Truncated {
            digest: digest.to_string(),
            len: body.len(),
            header: PIECE_HEADER_LEN,
        })?;

    let mut out = Vec::with_capacity(payload.len().saturating_mul(3));
    DeflateDecoder::new(payload)
        .read_to_end(&mut out)
        .map_err(|source| DecompressError::Inflate {
            digest: digest.to_string(),
            source,
        })?;
    Ok(out)
}

/// Fetches and decompresses single pieces from one remote source.
#[derive(Debug, Clone)]
pub struct PieceFetcher {
    http: HttpFetcher,
    source: Arc<RemoteSource>,
}

impl PieceFetcher {
    pub(crate) fn new(http: HttpFetcher, source: RemoteSource) -> Self {
        Self {
            http,
            source: Arc::new(source),
        }
    }

    /// The remote source pieces are fetched from.
    pub fn source(&self) -> &RemoteSource {
        &self.source
    }

    /// Fetch the piece listed in the manifest as `digest_b64` and return its
    /// decompressed bytes.
    pub async fn fetch_piece(&self, digest_b64: &str) -> Result<Vec<u8>, ClientError> {
        let digest = PieceDigest::from_base64url(digest_b64)?;
        let url = self.source.piece_url(&digest)?;
        let body = self.http.get_bytes(&url).await?;
        let compressed = body.len();

        let data = tokio::task::spawn_blocking({
            let digest = digest.clone();
            move || inflate_piece(&digest, &body)
        })
        .await
        .map_err(|e| ClientError::Worker(e.to_string()))??;

        tracing::debug!(
            digest = %digest,
            compressed,
            bytes = data.len(),
            "fetched piece"
        );
        Ok(data)
    }
}
