//! The sync pipeline and its run summaries.

use std::path::{Path, PathBuf};

use pieceline_archive::ArchiveIndex;
use pieceline_client::{PiecelineClient, Resolution};
use pieceline_core::partition::safe_relative_path;
use pieceline_core::{ExclusionRule, IndirectionDocument, PartitionOutcome};
use serde::Serialize;

use crate::config::SyncConfig;
use crate::error::SyncError;

/// The three decoded hop documents, without downloading any pieces.
#[derive(Debug, Clone, Serialize)]
pub struct Inspection {
    pub base: IndirectionDocument,
    pub catalog: IndirectionDocument,
    pub manifest: IndirectionDocument,
}

/// Result of one sync run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub base: IndirectionDocument,
    pub catalog: IndirectionDocument,
    pub manifest: IndirectionDocument,
    /// Length of the assembled buffer; zero when skipped.
    pub merged_pieces_size: u64,
    pub version: String,
    /// Directory holding this version's files.
    pub output_dir: String,
    /// Files written by this run, in table order.
    pub files_written: Vec<String>,
    /// True when the version was already archived and nothing was fetched.
    pub skipped: bool,
}

/// One artifact's resolve → assemble → partition → record pipeline.
#[derive(Debug, Clone)]
pub struct SyncPipeline {
    client: PiecelineClient,
    archive: ArchiveIndex,
    artifact_id: String,
    output_root: PathBuf,
    exclude: ExclusionRule,
}

impl SyncPipeline {
    /// Build the client and open the archive store named by `config`.
    pub async fn open(config: SyncConfig) -> Result<Self, SyncError> {
        let archive = ArchiveIndex::open(&config.archive_db).await?;
        let client = PiecelineClient::new(config.client.clone())?;
        Ok(Self::new(client, archive, &config))
    }

    /// Assemble a pipeline from an existing client and archive handle.
    pub fn new(client: PiecelineClient, archive: ArchiveIndex, config: &SyncConfig) -> Self {
        Self {
            client,
            archive,
            artifact_id: config.artifact_id.clone(),
            output_root: config.output_root.clone(),
            exclude: config.exclude.clone(),
        }
    }

    pub fn archive(&self) -> &ArchiveIndex {
        &self.archive
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    /// Resolve the chain and return the decoded documents.
    pub async fn inspect(&self) -> Result<Inspection, SyncError> {
        let res = self.client.resolve().await?;
        Ok(Inspection {
            base: res.bootstrap,
            catalog: res.catalog,
            manifest: res.manifest,
        })
    }

    /// Run the pipeline. With `force`, an already archived version is
    /// fetched and written again.
    pub async fn run(&self, force: bool) -> Result<SyncSummary, SyncError> {
        let res = self.client.resolve().await?;
        let version = res.version().to_string();
        let out_dir = self.output_dir(&version)?;

        if !force {
            if let Some(existing) = self.archive.find(&self.artifact_id, &version).await? {
                tracing::info!(
                    binary_id = %self.artifact_id,
                    version = %version,
                    path = %existing.path,
                    "version already archived, skipping"
                );
                return Ok(summary(res, 0, existing.path, Vec::new(), true));
            }
        }

        let mut assembler = self.client.assembler(res.remote.clone());
        if let Some(total) = res.manifest_record.total_size() {
            assembler = assembler.with_size_hint(total);
        }
        let buffer = assembler.assemble(&res.manifest_record.digests).await?;
        let merged = buffer.len() as u64;

        tokio::fs::create_dir_all(&out_dir)
            .await
            .map_err(|source| SyncError::Io {
                path: out_dir.display().to_string(),
                source,
            })?;
        let outcome = self.partition(&res, buffer, out_dir.clone()).await?;

        let out_path = out_dir.display().to_string();
        self.archive
            .record(&self.artifact_id, &version, &out_path)
            .await?;

        tracing::info!(
            binary_id = %self.artifact_id,
            version = %version,
            bytes = merged,
            files = outcome.written.len(),
            excluded = outcome.excluded.len(),
            "sync complete"
        );

        let written = outcome
            .written
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        Ok(summary(res, merged, out_path, written, false))
    }

    fn output_dir(&self, version: &str) -> Result<PathBuf, SyncError> {
        Ok(self
            .output_root
            .join(safe_relative_path(&self.artifact_id)?)
            .join(safe_relative_path(version)?))
    }

    async fn partition(
        &self,
        res: &Resolution,
        buffer: Vec<u8>,
        out_dir: PathBuf,
    ) -> Result<PartitionOutcome, SyncError> {
        let files = res.manifest_record.files.clone();
        let exclude = self.exclude.clone();
        tokio::task::spawn_blocking(move || {
            pieceline_core::partition(&files, &buffer, Path::new(&out_dir), |name| {
                exclude.matches(name)
            })
        })
        .await
        .map_err(|e| SyncError::Worker(e.to_string()))?
        .map_err(SyncError::from)
    }
}

fn summary(
    res: Resolution,
    merged_pieces_size: u64,
    output_dir: String,
    files_written: Vec<String>,
    skipped: bool,
) -> SyncSummary {
    SyncSummary {
        version: res.environment.version,
        base: res.bootstrap,
        catalog: res.catalog,
        manifest: res.manifest,
        merged_pieces_size,
        output_dir,
        files_written,
        skipped,
    }
}
