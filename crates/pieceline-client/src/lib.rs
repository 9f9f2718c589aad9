//! # pieceline-client: Typed HTTP client for a piece-addressed distribution
//!
//! Provides the network half of the pipeline:
//! - **Chain Resolver**: bootstrap → catalog → manifest ([`resolver`])
//! - **Piece Fetcher**: digest → URL → header strip → inflate ([`piece`])
//! - **Stream Assembler**: bounded-concurrency fetch with ordered
//!   reassembly ([`assemble`])
//!
//! ## Request Conventions
//!
//! Every request is a plain GET carrying a browser-like `User-Agent` and is
//! bounded by the configured timeout. Nothing is retried; a single failure
//! aborts the call that issued it.

pub mod assemble;
pub mod config;
pub mod error;
pub mod http;
pub mod piece;
pub mod resolver;

pub use assemble::StreamAssembler;
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, DecompressError, FetchError};
pub use piece::{PieceFetcher, RemoteSource};
pub use resolver::{ChainResolver, Resolution};

use crate::http::HttpFetcher;

/// Top-level distribution client. Holds the shared HTTP client and the
/// configured resolver.
#[derive(Debug, Clone)]
pub struct PiecelineClient {
    http: HttpFetcher,
    resolver: ChainResolver,
    concurrency: usize,
}

impl PiecelineClient {
    /// Create a client from configuration.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = HttpFetcher::new(&config)?;
        let resolver = ChainResolver::new(
            http.clone(),
            config.bootstrap_url,
            config.catalog_template,
            config.upgrade_insecure,
        );
        Ok(Self {
            http,
            resolver,
            concurrency: config.concurrency.max(1),
        })
    }

    /// Access the chain resolver.
    pub fn resolver(&self) -> &ChainResolver {
        &self.resolver
    }

    /// Walk bootstrap → catalog → manifest.
    pub async fn resolve(&self) -> Result<Resolution, ClientError> {
        self.resolver.resolve().await
    }

    /// A fetcher for single pieces from `source`.
    pub fn fetcher(&self, source: RemoteSource) -> PieceFetcher {
        PieceFetcher::new(self.http.clone(), source)
    }

    /// An assembler for pieces from `source`, using the configured window.
    pub fn assembler(&self, source: RemoteSource) -> StreamAssembler {
        StreamAssembler::new(self.fetcher(source), self.concurrency)
    }
}
