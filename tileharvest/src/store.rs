//! Output directory for harvested tiles.
//!
//! Each harvested item maps to exactly one file:
//!
//! ```text
//! {output_dir}/tile_id_{identifier}.jpg
//! ```
//!
//! That naming is the artifact contract other tooling reads, so it never
//! depends on the tile address or the provider.
//!
//! Existence alone marks an item as done. No size, hash or freshness check
//! is made; this is what makes re-runs free. Writes therefore go through a
//! hidden temp file in the same directory followed by a rename, so a
//! failed or interrupted write never leaves a truncated file at the
//! artifact path.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, warn};

/// Filename prefix of every artifact.
pub const ARTIFACT_PREFIX: &str = "tile_id_";

/// Extension of every artifact.
pub const ARTIFACT_EXTENSION: &str = "jpg";

/// Errors from the output directory.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The output directory could not be created or is not a directory
    #[error("cannot prepare output directory {path}: {source}")]
    Directory { path: PathBuf, source: io::Error },
    /// Checking for an existing artifact failed for a reason other than absence
    #[error("cannot inspect {path}: {source}")]
    Inspect { path: PathBuf, source: io::Error },
    /// Writing or renaming the artifact failed
    #[error("cannot write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

impl StoreError {
    /// Path the failed operation was acting on.
    pub fn path(&self) -> &Path {
        match self {
            StoreError::Directory { path, .. }
            | StoreError::Inspect { path, .. }
            | StoreError::Write { path, .. } => path,
        }
    }
}

/// The directory harvested artifacts are written to.
#[derive(Debug)]
pub struct TileStore {
    directory: PathBuf,
    temp_counter: AtomicU64,
}

impl TileStore {
    /// Opens the output directory, creating it (and parents) if missing.
    ///
    /// Calling this on an existing directory is not an error.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let directory = directory.into();

        std::fs::create_dir_all(&directory).map_err(|source| StoreError::Directory {
            path: directory.clone(),
            source,
        })?;
        if !directory.is_dir() {
            return Err(StoreError::Directory {
                path: directory,
                source: io::Error::new(io::ErrorKind::AlreadyExists, "not a directory"),
            });
        }

        debug!(directory = %directory.display(), "Output directory ready");

        Ok(Self {
            directory,
            temp_counter: AtomicU64::new(0),
        })
    }

    /// Returns the output directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the artifact filename for an identifier.
    pub fn artifact_name(identifier: &str) -> String {
        format!("{}{}.{}", ARTIFACT_PREFIX, identifier, ARTIFACT_EXTENSION)
    }

    /// Returns the deterministic artifact path for an identifier.
    pub fn artifact_path(&self, identifier: &str) -> PathBuf {
        self.directory.join(Self::artifact_name(identifier))
    }

    /// Checks whether the artifact for `identifier` already exists.
    pub async fn contains(&self, identifier: &str) -> Result<bool, StoreError> {
        let path = self.artifact_path(identifier);
        match tokio::fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Inspect { path, source }),
        }
    }

    /// Writes an artifact atomically and returns its final path.
    ///
    /// Data lands in a hidden temp file first and is renamed over the
    /// artifact path. On any failure the temp file is removed.
    pub async fn write(&self, identifier: &str, data: &[u8]) -> Result<PathBuf, StoreError> {
        let path = self.artifact_path(identifier);
        let temp_path = self.temp_path(identifier);

        if let Err(source) = Self::write_then_rename(&temp_path, &path, data).await {
            if let Err(e) = tokio::fs::remove_file(&temp_path).await {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!(path = %temp_path.display(), error = %e, "Failed to remove temp file");
                }
            }
            return Err(StoreError::Write { path, source });
        }

        Ok(path)
    }

    /// Removes temp files left behind by an interrupted earlier run.
    ///
    /// Only hidden `.tile_id_*.tmp` files are touched. Must not be called
    /// while another process writes into the same directory.
    pub fn remove_stale_temp_files(&self) -> Result<usize, StoreError> {
        let entries =
            std::fs::read_dir(&self.directory).map_err(|source| StoreError::Inspect {
                path: self.directory.clone(),
                source,
            })?;

        let mut removed = 0;
        for entry in entries.filter_map(|e| e.ok()) {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            let is_temp =
                name.starts_with(&format!(".{}", ARTIFACT_PREFIX)) && name.ends_with(".tmp");
            if !is_temp {
                continue;
            }
            match std::fs::remove_file(entry.path()) {
                Ok(()) => removed += 1,
                Err(e) => warn!(
                    path = %entry.path().display(),
                    error = %e,
                    "Failed to remove stale temp file"
                ),
            }
        }

        if removed > 0 {
            debug!(removed, directory = %self.directory.display(), "Removed stale temp files");
        }
        Ok(removed)
    }

    async fn write_then_rename(temp_path: &Path, path: &Path, data: &[u8]) -> io::Result<()> {
        use tokio::io::AsyncWriteExt;

        let mut file = tokio::fs::File::create(temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(temp_path, path).await
    }

    // Hidden, per-process and per-write unique so concurrent writers never
    // share a temp file.
    fn temp_path(&self, identifier: &str) -> PathBuf {
        let seq = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        self.directory.join(format!(
            ".{}.{}-{}.tmp",
            Self::artifact_name(identifier),
            std::process::id(),
            seq
        ))
    }
}
