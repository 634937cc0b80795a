//! Local filesystem operations under the upload root.

use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use tagvault_core::error::{AppError, ErrorKind};
use tagvault_core::result::AppResult;

use crate::paths::PathMapper;
use crate::walk::{self, WalkOutcome};

/// Filesystem access for the catalog's physical tree.
///
/// All methods take absolute physical paths, usually produced by the
/// [`PathMapper`].
#[derive(Debug, Clone)]
pub struct LocalDisk {
    mapper: PathMapper,
}

impl LocalDisk {
    /// Create the upload root if needed and wrap its canonical path.
    pub async fn new(upload_root: impl Into<PathBuf>) -> AppResult<Self> {
        let root = upload_root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create upload root: {}", root.display()),
                e,
            )
        })?;
        let root = fs::canonicalize(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to resolve upload root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self {
            mapper: PathMapper::new(root),
        })
    }

    /// The logical/physical path mapper for this root.
    pub fn mapper(&self) -> &PathMapper {
        &self.mapper
    }

    /// Whether a directory exists at `path`.
    ///
    /// Probe failures other than absence count as present, so an
    /// unreadable mount never looks like a deletion.
    pub async fn dir_exists(&self, path: &Path) -> bool {
        matches!(probe(path).await, Presence::Directory | Presence::Unknown)
    }

    /// Whether a regular file exists at `path`. Same probe rules as
    /// [`LocalDisk::dir_exists`].
    pub async fn file_exists(&self, path: &Path) -> bool {
        matches!(probe(path).await, Presence::File | Presence::Unknown)
    }

    /// Create a directory and all missing parents.
    pub async fn create_dir_all(&self, path: &Path) -> AppResult<()> {
        fs::create_dir_all(path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create directory: {}", path.display()),
                e,
            )
        })
    }

    /// Rename a file or directory, creating the destination's parent.
    pub async fn rename(&self, from: &Path, to: &Path) -> AppResult<()> {
        ensure_parent(to).await?;
        fs::rename(from, to).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to rename {} -> {}", from.display(), to.display()),
                e,
            )
        })?;
        debug!(from = %from.display(), to = %to.display(), "Renamed path");
        Ok(())
    }

    /// Remove a directory tree. An absent directory is not an error.
    pub async fn remove_dir_all(&self, path: &Path) -> AppResult<()> {
        match fs::remove_dir_all(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed directory");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete directory: {}", path.display()),
                e,
            )),
        }
    }

    /// Unlink a file. An absent file is not an error.
    pub async fn remove_file(&self, path: &Path) -> AppResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to delete file: {}", path.display()),
                e,
            )),
        }
    }

    /// Move a staged file to its final location.
    ///
    /// Falls back to copy and remove when a plain rename is refused,
    /// typically because staging lives on another device.
    pub async fn move_into_place(&self, staged: &Path, dest: &Path) -> AppResult<()> {
        ensure_parent(dest).await?;
        if let Err(rename_err) = fs::rename(staged, dest).await {
            debug!(
                staged = %staged.display(),
                error = %rename_err,
                "Rename failed, copying staged file instead"
            );
            fs::copy(staged, dest).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to copy {} -> {}", staged.display(), dest.display()),
                    e,
                )
            })?;
            if let Err(e) = fs::remove_file(staged).await {
                warn!(staged = %staged.display(), error = %e, "Failed to remove staged file");
            }
        }
        Ok(())
    }

    /// Write a byte stream to `path`, refusing to exceed `limit` bytes.
    ///
    /// A partially written file is removed when the write fails.
    pub async fn write_stream<S, E>(&self, path: &Path, mut stream: S, limit: u64) -> AppResult<u64>
    where
        S: Stream<Item = Result<Bytes, E>> + Unpin,
        E: std::error::Error + Send + Sync + 'static,
    {
        ensure_parent(path).await?;
        let mut file = fs::File::create(path).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create file: {}", path.display()),
                e,
            )
        })?;

        let mut total_bytes = 0u64;
        let result: AppResult<()> = async {
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| {
                    AppError::with_source(ErrorKind::Storage, "Stream read error", e)
                })?;
                total_bytes += chunk.len() as u64;
                if total_bytes > limit {
                    return Err(AppError::payload_too_large(format!(
                        "Upload exceeds the limit of {limit} bytes"
                    )));
                }
                file.write_all(&chunk).await.map_err(|e| {
                    AppError::with_source(ErrorKind::Storage, "Failed to write chunk", e)
                })?;
            }
            file.flush()
                .await
                .map_err(|e| AppError::with_source(ErrorKind::Storage, "Failed to flush file", e))
        }
        .await;

        if let Err(e) = result {
            drop(file);
            let _ = fs::remove_file(path).await;
            return Err(e);
        }

        debug!(path = %path.display(), bytes = total_bytes, "Wrote file from stream");
        Ok(total_bytes)
    }

    /// Open a file for streaming reads.
    pub async fn open_read(&self, path: &Path) -> AppResult<ReaderStream<fs::File>> {
        let file = fs::File::open(path).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                AppError::not_found(format!("File not found: {}", path.display()))
            } else {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to open file: {}", path.display()),
                    e,
                )
            }
        })?;
        Ok(ReaderStream::new(file))
    }

    /// Walk a directory tree on the blocking pool.
    pub async fn walk_tree(&self, root: &Path) -> AppResult<WalkOutcome> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || walk::walk_tree(&root))
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Directory walk task failed", e)
            })
    }
}

/// What a probe found at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Absent,
    Directory,
    File,
    Other,
    Unknown,
}

async fn probe(path: &Path) -> Presence {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_dir() => Presence::Directory,
        Ok(meta) if meta.is_file() => Presence::File,
        Ok(_) => Presence::Other,
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            Presence::Absent
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Probe failed, assuming present");
            Presence::Unknown
        }
    }
}

/// Ensure the parent directory of a path exists.
async fn ensure_parent(path: &Path) -> AppResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to create parent directory: {}", parent.display()),
                e,
            )
        })?;
    }
    Ok(())
}
