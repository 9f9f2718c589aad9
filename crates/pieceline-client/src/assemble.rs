//! # Stream Assembler
//!
//! Fetches every piece listed in the manifest and concatenates them in
//! listed order.
//!
//! ## Ordering Invariant
//!
//! Pieces are fetched concurrently (bounded by the configured window) and
//! may complete in any order. The stream yields results in digest order,
//! holding early completions until their predecessors arrive, and each
//! piece is appended to the buffer and dropped as soon as it is next in
//! line. At most one window of decoded pieces is held beside the buffer.
//!
//! The first failure drops the in-flight stream and fails the whole
//! assembly; no partial buffer is returned.

use futures::stream::{self, StreamExt};

use crate::error::ClientError;
use crate::piece::PieceFetcher;

/// Assembles the contiguous byte stream for one manifest.
#[derive(Debug, Clone)]
pub struct StreamAssembler {
    fetcher: PieceFetcher,
    concurrency: usize,
    size_hint: usize,
}

impl StreamAssembler {
    pub(crate) fn new(fetcher: PieceFetcher, concurrency: usize) -> Self {
        Self {
            fetcher,
            concurrency: concurrency.max(1),
            size_hint: 0,
        }
    }

    /// Preallocate the output buffer for `bytes`, usually the manifest's
    /// total file size. A hint that cannot be reserved is ignored.
    pub fn with_size_hint(mut self, bytes: u64) -> Self {
        self.size_hint = usize::try_from(bytes).unwrap_or(0);
        self
    }

    /// The fetcher used for individual pieces.
    pub fn fetcher(&self) -> &PieceFetcher {
        &self.fetcher
    }

    /// Fetch and concatenate the pieces named by `digests`, in order.
    pub async fn assemble(&self, digests: &[String]) -> Result<Vec<u8>, ClientError> {
        tracing::info!(
            pieces = digests.len(),
            concurrency = self.concurrency,
            "assembling pieces"
        );

        let mut buffer = Vec::new();
        if buffer.try_reserve_exact(self.size_hint).is_err() {
            tracing::warn!(size_hint = self.size_hint, "could not preallocate assembly buffer");
        }
        let mut pending = stream::iter(0..digests.len())
            .map(|index| {
                let digest = &digests[index];
                async move {
                    let result = self.fetcher.fetch_piece(digest).await;
                    (index, result)
                }
            })
            .buffered(self.concurrency);

        while let Some((index, result)) = pending.next().await {
            let piece = result.map_err(|e| {
                tracing::error!(index, digest = %digests[index], "piece failed: {e}");
                e
            })?;
            buffer.extend_from_slice(&piece);
        }

        tracing::info!(bytes = buffer.len(), "assembled buffer");
        Ok(buffer)
    }
}
