//! # File Partitioner
//!
//! Splits the assembled byte stream into the files described by the
//! manifest's file table.
//!
//! ## Offset Invariant
//!
//! The file table partitions the buffer into contiguous ranges in table
//! order. The running offset advances by every entry's size, including
//! excluded entries: an excluded file still occupies its slot in the stream,
//! and skipping the advance would shift every later file.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::document::FileEntry;
use crate::error::PartitionError;

/// What a partition run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionOutcome {
    /// Paths written, in table order.
    pub written: Vec<PathBuf>,
    /// Names of entries skipped by the exclusion predicate.
    pub excluded: Vec<String>,
    /// Total bytes written to disk.
    pub bytes_written: u64,
}

/// Validate a remote-supplied name as a relative path that stays inside
/// its base directory.
pub fn safe_relative_path(name: &str) -> Result<PathBuf, PartitionError> {
    let unsafe_path = || PartitionError::UnsafePath(name.to_string());
    let mut out = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(unsafe_path())
            }
        }
    }
    if out.as_os_str().is_empty() {
        return Err(unsafe_path());
    }
    Ok(out)
}

/// Write every non-excluded entry of `files` to `out_dir/<name>`.
///
/// The table must cover `buffer` exactly; this is checked, along with the
/// name of every entry that will be written, before anything is written.
/// Excluded entries only need a size. A write failure part way through
/// leaves earlier files on disk and returns an error.
pub fn partition<F>(
    files: &[FileEntry],
    buffer: &[u8],
    out_dir: &Path,
    exclude: F,
) -> Result<PartitionOutcome, PartitionError>
where
    F: Fn(&str) -> bool,
{
    let len = buffer.len() as u64;
    let table = files
        .iter()
        .try_fold(0u64, |acc, entry| acc.checked_add(entry.size))
        .unwrap_or(u64::MAX);
    if table != len {
        return Err(PartitionError::SizeMismatch { table, buffer: len });
    }

    let targets: Vec<Option<PathBuf>> = files
        .iter()
        .map(|entry| {
            if exclude(&entry.name) {
                Ok(None)
            } else {
                safe_relative_path(&entry.name).map(Some)
            }
        })
        .collect::<Result<_, _>>()?;

    let mut outcome = PartitionOutcome::default();
    let mut offset: u64 = 0;

    for (entry, target) in files.iter().zip(targets) {
        let out_of_bounds = || PartitionError::OutOfBounds {
            name: entry.name.clone(),
            offset,
            size: entry.size,
            len,
        };
        let end = offset
            .checked_add(entry.size)
            .filter(|end| *end <= len)
            .ok_or_else(out_of_bounds)?;

        if let Some(rel) = target {
            let path = out_dir.join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|source| PartitionError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            // `end <= len` and `len` came from a slice length, so both fit in usize.
            let slice = &buffer[offset as usize..end as usize];
            fs::write(&path, slice).map_err(|source| PartitionError::Write {
                path: path.clone(),
                source,
            })?;
            tracing::debug!(path = %path.display(), offset, size = entry.size, "wrote entry");
            outcome.bytes_written += entry.size;
            outcome.written.push(path);
        } else {
            tracing::debug!(name = %entry.name, offset, size = entry.size, "skipping excluded entry");
            outcome.excluded.push(entry.name.clone());
        }

        offset = end;
    }

    tracing::info!(
        out_dir = %out_dir.display(),
        written = outcome.written.len(),
        excluded = outcome.excluded.len(),
        bytes = outcome.bytes_written,
        "partitioned assembled buffer"
    );
    Ok(outcome)
}
