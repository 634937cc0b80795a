//! File download service: streams file content from disk.

use std::path::Path;
use std::sync::Arc;

use tokio_util::io::ReaderStream;
use tracing::debug;

use tagvault_core::error::AppError;
use tagvault_core::result::AppResult;
use tagvault_core::types::FileId;
use tagvault_database::CatalogStore;
use tagvault_entity::File;
use tagvault_storage::LocalDisk;
use tagvault_worker::CleanupJobs;

/// Handles file downloads.
#[derive(Debug, Clone)]
pub struct DownloadService {
    /// Catalog store.
    store: Arc<dyn CatalogStore>,
    /// Physical tree.
    disk: LocalDisk,
    /// Record removal for vanished files.
    cleanup: CleanupJobs,
}

/// File metadata and an open content stream.
#[derive(Debug)]
pub struct DownloadResult {
    /// File metadata.
    pub file: File,
    /// File content.
    pub stream: ReaderStream<tokio::fs::File>,
    /// MIME type for Content-Type header.
    pub content_type: String,
    /// Suggested filename for Content-Disposition.
    pub filename: String,
}

impl DownloadService {
    /// Creates a new download service.
    pub fn new(store: Arc<dyn CatalogStore>, disk: LocalDisk, cleanup: CleanupJobs) -> Self {
        Self {
            store,
            disk,
            cleanup,
        }
    }

    /// Open a file for download.
    ///
    /// A record whose physical file is gone is reported as not found and
    /// its removal is scheduled.
    pub async fn open_download(&self, id: FileId) -> AppResult<DownloadResult> {
        let file = self
            .store
            .find_file(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;

        let path = Path::new(&file.storage_path);
        let stream = match self.disk.open_read(path).await {
            Ok(stream) => stream,
            Err(e) if e.is_not_found() => {
                debug!(
                    file_id = %id,
                    storage_path = %file.storage_path,
                    "Download of vanished file"
                );
                self.cleanup.remove_file_record(id);
                return Err(AppError::not_found(format!("File {id} not found")));
            }
            Err(e) => return Err(e),
        };

        let content_type = file
            .mime_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let filename = file.name.clone();

        Ok(DownloadResult {
            file,
            stream,
            content_type,
            filename,
        })
    }
}
