//! Upload staging and placement.
//!
//! Bytes are first written to the staging directory under a random
//! name. Once every item of a request is staged, [`UploadService::finalize`]
//! resolves each item's folder chain below the target folder, moves the
//! staged file into place, and records it.

use std::collections::HashMap;
use std::path::PathBuf;
use std::pin::pin;
use std::sync::Arc;

use bytes::Bytes;
use futures::Stream;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use tagvault_core::config::StorageConfig;
use tagvault_core::error::AppError;
use tagvault_core::result::AppResult;
use tagvault_core::types::FolderId;
use tagvault_database::CatalogStore;
use tagvault_entity::folder::path;
use tagvault_entity::{File, Folder, NewFile, NewFolder};
use tagvault_storage::LocalDisk;
use tagvault_storage::mime::mime_from_name;
use tagvault_worker::CleanupJobs;

use crate::sync::find_or_insert_folder;

/// One uploaded item whose bytes are durably staged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedUpload {
    /// Path relative to the target folder, `/`-delimited, ending in the file name.
    pub relative_path: String,
    /// Where the bytes currently live.
    pub staged_path: PathBuf,
    /// Number of bytes staged.
    pub size_bytes: u64,
}

/// Handles upload staging and placement.
#[derive(Debug, Clone)]
pub struct UploadService {
    /// Catalog store.
    store: Arc<dyn CatalogStore>,
    /// Physical tree.
    disk: LocalDisk,
    /// Deferred disk work.
    cleanup: CleanupJobs,
    /// Staging directory.
    staging_dir: PathBuf,
    /// Per-item size limit.
    max_upload_size: u64,
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(
        store: Arc<dyn CatalogStore>,
        disk: LocalDisk,
        cleanup: CleanupJobs,
        config: &StorageConfig,
    ) -> Self {
        Self {
            store,
            disk,
            cleanup,
            staging_dir: PathBuf::from(&config.staging_dir),
            max_upload_size: config.max_upload_size_bytes,
        }
    }

    /// Write one item's bytes to the staging directory.
    pub async fn stage<S, E>(&self, relative_path: &str, stream: S) -> AppResult<StagedUpload>
    where
        S: Stream<Item = Result<Bytes, E>> + Send,
        E: std::error::Error + Send + Sync + 'static,
    {
        split_relative_path(relative_path)?;

        let staged_path = self.staging_dir.join(Uuid::new_v4().to_string());
        let size_bytes = self
            .disk
            .write_stream(&staged_path, pin!(stream), self.max_upload_size)
            .await?;

        debug!(relative_path, staged = %staged_path.display(), size_bytes, "Staged upload");
        Ok(StagedUpload {
            relative_path: relative_path.to_string(),
            staged_path,
            size_bytes,
        })
    }

    /// Remove staged bytes that will not be finalized.
    pub async fn discard(&self, staged: &[StagedUpload]) {
        for item in staged {
            if let Err(e) = self.disk.remove_file(&item.staged_path).await {
                warn!(
                    staged = %item.staged_path.display(),
                    error = %e,
                    "Failed to discard staged upload"
                );
            }
        }
    }

    /// Walk `segments` below `base`, finding or creating each folder.
    ///
    /// Every folder on the chain is ensured both as a record and as a
    /// directory. Returns the deepest folder, or `base` for no segments.
    pub async fn resolve_folder_chain(
        &self,
        base: &Folder,
        segments: &[&str],
    ) -> AppResult<Folder> {
        let mut current = base.clone();
        for segment in segments {
            let data = NewFolder::child_of(&current, segment);
            let (folder, created) = find_or_insert_folder(self.store.as_ref(), &data).await?;
            self.disk
                .create_dir_all(&self.disk.mapper().to_physical(&folder.full_path))
                .await?;
            if created {
                debug!(
                    folder_id = %folder.id,
                    full_path = %folder.full_path,
                    "Created folder for upload"
                );
            }
            current = folder;
        }
        Ok(current)
    }

    /// Place staged items below `base_folder_id` and record them.
    ///
    /// Files come back in input order. On failure, items not yet placed
    /// are discarded from staging.
    pub async fn finalize(
        &self,
        base_folder_id: FolderId,
        staged: Vec<StagedUpload>,
    ) -> AppResult<Vec<File>> {
        let result = self.place_all(base_folder_id, &staged).await;
        match result {
            Ok(files) => {
                info!(folder_id = %base_folder_id, count = files.len(), "Upload finalized");
                Ok(files)
            }
            Err((placed, e)) => {
                self.discard(&staged[placed..]).await;
                Err(e)
            }
        }
    }

    async fn place_all(
        &self,
        base_folder_id: FolderId,
        staged: &[StagedUpload],
    ) -> Result<Vec<File>, (usize, AppError)> {
        let base = match self.store.find_folder(base_folder_id).await {
            Ok(Some(folder)) => folder,
            Ok(None) => {
                return Err((0, AppError::not_found(format!("Folder {base_folder_id} not found"))));
            }
            Err(e) => return Err((0, e)),
        };

        let mut split = Vec::with_capacity(staged.len());
        for item in staged {
            split.push(split_relative_path(&item.relative_path).map_err(|e| (0, e))?);
        }

        let mut chains: HashMap<Vec<&str>, Folder> = HashMap::new();
        let mut files = Vec::with_capacity(staged.len());
        for (index, (item, (dirs, name))) in staged.iter().zip(split).enumerate() {
            let folder = match chains.get(&dirs) {
                Some(folder) => folder.clone(),
                None => {
                    let folder = self
                        .resolve_folder_chain(&base, &dirs)
                        .await
                        .map_err(|e| (index, e))?;
                    chains.insert(dirs, folder.clone());
                    folder
                }
            };
            let file = self.place(&folder, name, item).await.map_err(|e| (index, e))?;
            files.push(file);
        }
        Ok(files)
    }

    async fn place(&self, folder: &Folder, name: &str, item: &StagedUpload) -> AppResult<File> {
        let dest = self
            .disk
            .mapper()
            .to_physical(&folder.full_path)
            .join(disk_name(name));
        self.disk.move_into_place(&item.staged_path, &dest).await?;

        let data = NewFile {
            folder_id: folder.id,
            name: name.to_string(),
            storage_path: dest.to_string_lossy().into_owned(),
            size_bytes: i64::try_from(item.size_bytes).unwrap_or(i64::MAX),
            mime_type: mime_from_name(name),
        };
        match self.store.insert_file(&data).await {
            Ok(file) => Ok(file),
            Err(e) => {
                self.cleanup.unlink_file(dest);
                Err(e)
            }
        }
    }
}

/// Split a relative upload path into directory segments and a file name.
fn split_relative_path(relative_path: &str) -> AppResult<(Vec<&str>, &str)> {
    let mut segments: Vec<&str> = relative_path.split('/').collect();
    if segments.iter().any(|s| !path::is_valid_segment(s)) {
        return Err(AppError::validation(format!(
            "Invalid upload path '{relative_path}'"
        )));
    }
    let name = segments.pop().unwrap_or_default();
    Ok((segments, name))
}

/// Collision-proof on-disk name; the display name is kept in the record.
fn disk_name(name: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{}-{}", &id[..12], name)
}
