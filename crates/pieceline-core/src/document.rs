//! # Hop Documents
//!
//! Typed views over the three decoded [`IndirectionDocument`]s. Each record
//! is validated once, at the point of extraction, so later stages never
//! reach into raw JSON.
//!
//! | Hop | Record | Required fields |
//! |-----|--------|-----------------|
//! | bootstrap | [`Environment`] | `environments.production.id`, `.version` |
//! | catalog | [`Catalog`] | `metafile`, `config.remote.baseUrl`, `config.remote.pieceFormat` |
//! | manifest | [`Manifest`] | `pieces.digests`, `files` |

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DocumentError;
use crate::token::IndirectionDocument;

/// The production environment advertised by the bootstrap document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// Identifier substituted into the catalog URL template.
    pub id: String,
    /// Version string of the distribution.
    pub version: String,
}

/// Where pieces live and how their paths are formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteBase {
    /// Base URL that derived piece paths are appended to.
    pub base_url: String,
    /// Path template source, e.g. `pieces/{SubString:0,2,{TargetDigest}}/{TargetDigest}.solidpiece`.
    pub piece_format: String,
}

/// The catalog hop: manifest location plus the remote piece base.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    /// URL of the manifest token.
    pub metafile: String,
    /// Remote piece base configuration.
    pub remote: RemoteBase,
}

/// One output file: a relative path and its byte length in the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path-like name relative to the output directory.
    pub name: String,
    /// Number of bytes this entry occupies in the assembled buffer.
    pub size: u64,
}

/// The manifest hop: ordered piece digests and the file table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Piece digests in assembly order (URL-safe base64).
    pub digests: Vec<String>,
    /// File table in stream order.
    pub files: Vec<FileEntry>,
}

impl Manifest {
    /// Total bytes the file table describes.
    pub fn total_size(&self) -> Option<u64> {
        self.files
            .iter()
            .try_fold(0u64, |acc, entry| acc.checked_add(entry.size))
    }
}

// -- Raw shapes: every field optional so absence maps to MissingField ---------

#[derive(Deserialize)]
struct RawBootstrap {
    environments: Option<RawEnvironments>,
}

#[derive(Deserialize)]
struct RawEnvironments {
    production: Option<RawEnvironment>,
}

#[derive(Deserialize)]
struct RawEnvironment {
    id: Option<Value>,
    version: Option<Value>,
}

#[derive(Deserialize)]
struct RawCatalog {
    metafile: Option<String>,
    config: Option<RawCatalogConfig>,
}

#[derive(Deserialize)]
struct RawCatalogConfig {
    remote: Option<RawRemote>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRemote {
    base_url: Option<String>,
    piece_format: Option<String>,
}

#[derive(Deserialize)]
struct RawManifest {
    pieces: Option<RawPieces>,
    files: Option<Vec<FileEntry>>,
}

#[derive(Deserialize)]
struct RawPieces {
    digests: Option<Vec<String>>,
}

fn parse<T: DeserializeOwned>(
    doc: &IndirectionDocument,
    document: &'static str,
) -> Result<T, DocumentError> {
    serde_json::from_value(Value::Object(doc.clone()))
        .map_err(|source| DocumentError::Malformed { document, source })
}

/// Render an identifier that may be served as a string or a number.
fn scalar_string(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn required<T>(
    value: Option<T>,
    document: &'static str,
    field: &'static str,
) -> Result<T, DocumentError> {
    value.ok_or(DocumentError::MissingField { document, field })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

impl Environment {
    /// Extract the production environment from a bootstrap document.
    pub fn extract(doc: &IndirectionDocument) -> Result<Self, DocumentError> {
        let raw: RawBootstrap = parse(doc, "bootstrap")?;
        let production = raw.environments.and_then(|envs| envs.production);
        let (id, version) = match production {
            Some(env) => (scalar_string(env.id), scalar_string(env.version)),
            None => (None, None),
        };

        let id = required(id, "bootstrap", "environments.production.id")?;
        if !is_path_segment(&id) {
            return Err(DocumentError::InvalidField {
                document: "bootstrap",
                field: "environments.production.id",
                value: id,
            });
        }
        Ok(Self {
            id,
            version: required(version, "bootstrap", "environments.production.version")?,
        })
    }
}

/// The environment id is spliced into the catalog URL path verbatim, so it
/// must be a single unreserved segment.
fn is_path_segment(value: &str) -> bool {
    value != "."
        && value != ".."
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

impl Catalog {
    /// Extract the manifest location and remote base from a catalog document.
    pub fn extract(doc: &IndirectionDocument) -> Result<Self, DocumentError> {
        let raw: RawCatalog = parse(doc, "catalog")?;
        let metafile = required(non_empty(raw.metafile), "catalog", "metafile")?;
        let remote = raw.config.and_then(|config| config.remote);
        let (base_url, piece_format) = match remote {
            Some(r) => (non_empty(r.base_url), non_empty(r.piece_format)),
            None => (None, None),
        };

        Ok(Self {
            metafile,
            remote: RemoteBase {
                base_url: required(base_url, "catalog", "config.remote.baseUrl")?,
                piece_format: required(piece_format, "catalog", "config.remote.pieceFormat")?,
            },
        })
    }
}

impl Manifest {
    /// Extract the digest list and file table from a manifest document.
    pub fn extract(doc: &IndirectionDocument) -> Result<Self, DocumentError> {
        let raw: RawManifest = parse(doc, "manifest")?;
        let digests = raw.pieces.and_then(|pieces| pieces.digests);

        Ok(Self {
            digests: required(digests, "manifest", "pieces.digests")?,
            files: required(raw.files, "manifest", "files")?,
        })
    }
}
