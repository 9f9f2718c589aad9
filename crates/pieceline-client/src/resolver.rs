//! # Chain Resolver
//!
//! Walks the three-hop indirection:
//!
//! 1. **Bootstrap**: yields the production environment id and version.
//! 2. **Catalog**: located by rendering the catalog template with the id;
//!    yields the manifest URL and the remote piece base.
//! 3. **Manifest**: yields the piece digests and the file table.
//!
//! Each hop depends on the previous one, so the walk is sequential. A
//! missing field stops the walk before the next request is issued.

use pieceline_core::token::{self, IndirectionDocument, ENVELOPE_KEY};
use pieceline_core::{Catalog, Environment, Manifest, PathTemplate};
use url::Url;

use crate::config::CATALOG_ID_VAR;
use crate::error::ClientError;
use crate::http::HttpFetcher;
use crate::piece::RemoteSource;

/// Everything the chain walk produced.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// Decoded bootstrap document.
    pub bootstrap: IndirectionDocument,
    /// Decoded catalog document.
    pub catalog: IndirectionDocument,
    /// Decoded manifest document.
    pub manifest: IndirectionDocument,
    /// Production environment from the bootstrap document.
    pub environment: Environment,
    /// Catalog record (manifest URL and raw remote base).
    pub catalog_record: Catalog,
    /// Manifest record (digests and file table).
    pub manifest_record: Manifest,
    /// Compiled remote piece source.
    pub remote: RemoteSource,
}

impl Resolution {
    /// Version string of the resolved distribution.
    pub fn version(&self) -> &str {
        &self.environment.version
    }
}

/// Resolves bootstrap → catalog → manifest.
#[derive(Debug, Clone)]
pub struct ChainResolver {
    http: HttpFetcher,
    bootstrap_url: Url,
    catalog_template: PathTemplate,
    upgrade_insecure: bool,
}

impl ChainResolver {
    pub(crate) fn new(
        http: HttpFetcher,
        bootstrap_url: Url,
        catalog_template: PathTemplate,
        upgrade_insecure: bool,
    ) -> Self {
        Self {
            http,
            bootstrap_url,
            catalog_template,
            upgrade_insecure,
        }
    }

    /// Walk the full chain.
    pub async fn resolve(&self) -> Result<Resolution, ClientError> {
        let bootstrap = self.fetch_document(self.bootstrap_url.as_str()).await?;
        let environment = Environment::extract(&bootstrap)?;
        tracing::info!(
            id = %environment.id,
            version = %environment.version,
            "resolved bootstrap document"
        );

        let catalog_url = self
            .catalog_template
            .render(&[(CATALOG_ID_VAR, environment.id.as_str())])?;
        let catalog = self.fetch_document(&catalog_url).await?;
        let catalog_record = Catalog::extract(&catalog)?;
        let remote = RemoteSource::compile(&catalog_record.remote, self.upgrade_insecure)?;
        tracing::info!(
            metafile = %catalog_record.metafile,
            base_url = %remote.base_url(),
            "resolved catalog document"
        );

        let manifest = self.fetch_document(&catalog_record.metafile).await?;
        let manifest_record = Manifest::extract(&manifest)?;
        tracing::info!(
            pieces = manifest_record.digests.len(),
            files = manifest_record.files.len(),
            "resolved manifest document"
        );

        Ok(Resolution {
            bootstrap,
            catalog,
            manifest,
            environment,
            catalog_record,
            manifest_record,
            remote,
        })
    }

    /// Fetch one hop and decode its token.
    async fn fetch_document(&self, url: &str) -> Result<IndirectionDocument, ClientError> {
        let body = self.http.get_text(url).await?;
        let token = token::extract_token(&body, ENVELOPE_KEY)?;
        Ok(token::decode(&token)?)
    }
}
