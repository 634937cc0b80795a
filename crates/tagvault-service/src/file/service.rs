//! Core file operations.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use tagvault_core::error::AppError;
use tagvault_core::result::AppResult;
use tagvault_core::types::FileId;
use tagvault_database::CatalogStore;
use tagvault_entity::File;
use tagvault_entity::folder::path;
use tagvault_worker::CleanupJobs;

/// Handles file lookup, rename, and delete.
#[derive(Debug, Clone)]
pub struct FileService {
    /// Catalog store.
    store: Arc<dyn CatalogStore>,
    /// Deferred disk work.
    cleanup: CleanupJobs,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(store: Arc<dyn CatalogStore>, cleanup: CleanupJobs) -> Self {
        Self { store, cleanup }
    }

    /// Gets a file by ID.
    pub async fn get(&self, id: FileId) -> AppResult<File> {
        self.store
            .find_file(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))
    }

    /// Changes the display name. The physical file keeps its name.
    pub async fn rename(&self, id: FileId, name: &str) -> AppResult<File> {
        let name = name.trim();
        if !path::is_valid_segment(name) {
            return Err(AppError::validation(format!("'{name}' is not a valid file name")));
        }

        let file = self
            .store
            .rename_file(id, name)
            .await?
            .ok_or_else(|| AppError::not_found(format!("File {id} not found")))?;

        info!(file_id = %id, name = %file.name, "Renamed file");
        Ok(file)
    }

    /// Deletes the record now; the physical file is unlinked by a queued job.
    pub async fn delete(&self, id: FileId) -> AppResult<()> {
        let file = self.get(id).await?;
        self.store.delete_file(id).await?;
        self.cleanup.unlink_file(PathBuf::from(&file.storage_path));

        info!(file_id = %id, storage_path = %file.storage_path, "Deleted file");
        Ok(())
    }
}
