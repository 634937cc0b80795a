//! Folder operations: root bootstrap, listing, create, rename, delete, sync.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use tagvault_core::config::StorageConfig;
use tagvault_core::error::AppError;
use tagvault_core::result::AppResult;
use tagvault_core::types::FolderId;
use tagvault_database::CatalogStore;
use tagvault_entity::folder::path;
use tagvault_entity::{File, Folder, NewFolder};
use tagvault_storage::LocalDisk;
use tagvault_worker::CleanupJobs;

use crate::sync::{Reconciler, StaleFilter, SyncReport, find_or_insert_folder};

/// A folder listing as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderContents {
    /// The listed folder.
    pub folder: Folder,
    /// Ancestor chain from the root down to the listed folder.
    pub breadcrumbs: Vec<Folder>,
    /// Child folders confirmed present on disk.
    pub folders: Vec<Folder>,
    /// Files confirmed present on disk.
    pub files: Vec<File>,
}

/// Manages folder operations.
#[derive(Debug, Clone)]
pub struct FolderService {
    /// Catalog store.
    store: Arc<dyn CatalogStore>,
    /// Physical tree.
    disk: LocalDisk,
    /// Deferred disk work and record removal.
    cleanup: CleanupJobs,
    /// Background reconciliation.
    reconciler: Reconciler,
    /// Per-read existence filter.
    stale: StaleFilter,
    /// Name of the root folder.
    root_name: String,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(
        store: Arc<dyn CatalogStore>,
        disk: LocalDisk,
        cleanup: CleanupJobs,
        reconciler: Reconciler,
        stale: StaleFilter,
        config: &StorageConfig,
    ) -> Self {
        Self {
            store,
            disk,
            cleanup,
            reconciler,
            stale,
            root_name: config.root_folder_name.clone(),
        }
    }

    /// Make sure the root folder exists in the store and on disk.
    pub async fn ensure_root(&self) -> AppResult<Folder> {
        let root = match self.store.root_folder().await? {
            Some(root) => root,
            None => {
                let data = NewFolder {
                    name: self.root_name.clone(),
                    parent_id: None,
                    full_path: format!("/{}", self.root_name),
                };
                let (root, created) = find_or_insert_folder(self.store.as_ref(), &data).await?;
                if created {
                    info!(folder_id = %root.id, full_path = %root.full_path, "Created root folder");
                }
                root
            }
        };

        if root.name != self.root_name {
            warn!(
                existing = %root.name,
                configured = %self.root_name,
                "Root folder name differs from configuration, keeping existing root"
            );
        }

        self.disk
            .create_dir_all(&self.disk.mapper().to_physical(&root.full_path))
            .await?;
        Ok(root)
    }

    /// The root folder.
    pub async fn root(&self) -> AppResult<Folder> {
        self.store
            .root_folder()
            .await?
            .ok_or_else(|| AppError::not_found("Root folder has not been created"))
    }

    /// Gets a folder by ID.
    pub async fn get(&self, id: FolderId) -> AppResult<Folder> {
        self.store
            .find_folder(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))
    }

    /// List a folder's children and files.
    ///
    /// Returns what the store knows right now minus rows that fail the
    /// existence probe, then queues a reconciliation pass so the next
    /// read sees anything added on disk.
    pub async fn list_contents(&self, id: FolderId) -> AppResult<FolderContents> {
        let folder = self.get(id).await?;

        if !folder.is_root()
            && !self
                .disk
                .dir_exists(&self.disk.mapper().to_physical(&folder.full_path))
                .await
        {
            self.cleanup.remove_folder_record(folder.id);
            return Err(AppError::not_found(format!("Folder {id} not found")));
        }

        let breadcrumbs = self.store.list_ancestors(id).await?;
        let folders = self
            .stale
            .folders(self.store.list_child_folders(id).await?)
            .await;
        let files = self
            .stale
            .files(self.store.list_files_in_folder(id).await?)
            .await;

        self.reconciler.schedule(&folder);

        Ok(FolderContents {
            folder,
            breadcrumbs,
            folders,
            files,
        })
    }

    /// Creates a child folder, in the store and on disk.
    pub async fn create(&self, parent_id: FolderId, name: &str) -> AppResult<Folder> {
        let name = validate_name(name)?;
        let parent = self.get(parent_id).await?;

        let folder = self
            .store
            .insert_folder(&NewFolder::child_of(&parent, name))
            .await?;

        let physical = self.disk.mapper().to_physical(&folder.full_path);
        if let Err(e) = self.disk.create_dir_all(&physical).await {
            self.store.delete_folder(folder.id).await?;
            return Err(e);
        }

        info!(folder_id = %folder.id, full_path = %folder.full_path, "Created folder");
        Ok(folder)
    }

    /// Renames a folder.
    ///
    /// Descendant paths and file storage paths are rewritten right away;
    /// the directory itself is renamed by a queued job.
    pub async fn rename(&self, id: FolderId, name: &str) -> AppResult<Folder> {
        let name = validate_name(name)?;
        let folder = self.get(id).await?;
        if folder.is_root() {
            return Err(AppError::validation("The root folder cannot be renamed"));
        }
        if folder.name == name {
            return Ok(folder);
        }

        let parent_path = path::parent(&folder.full_path)
            .ok_or_else(|| AppError::internal("Non-root folder has no parent path"))?;
        let new_path = path::join(parent_path, name);

        if self.store.find_folder_by_path(&new_path).await?.is_some() {
            return Err(AppError::conflict(format!("Folder '{new_path}' already exists")));
        }

        let mapper = self.disk.mapper();
        let old_physical = mapper.to_physical(&folder.full_path);
        let new_physical = mapper.to_physical(&new_path);
        if self.disk.dir_exists(&new_physical).await {
            return Err(AppError::conflict(format!(
                "A directory named '{name}' already exists on disk"
            )));
        }

        let renamed = self
            .store
            .rename_folder(id, name, &new_path)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Folder {id} not found")))?;

        let moved = self
            .store
            .rewrite_storage_prefix(
                &old_physical.to_string_lossy(),
                &new_physical.to_string_lossy(),
            )
            .await?;

        self.cleanup.rename_path(old_physical, new_physical);

        info!(
            folder_id = %id,
            from = %folder.full_path,
            to = %renamed.full_path,
            files = moved,
            "Renamed folder"
        );
        Ok(renamed)
    }

    /// Deletes a folder record with its subtree; the directory goes later.
    pub async fn delete(&self, id: FolderId) -> AppResult<()> {
        let folder = self.get(id).await?;
        if folder.is_root() {
            return Err(AppError::validation("The root folder cannot be deleted"));
        }

        self.store.delete_folder(id).await?;
        self.cleanup
            .remove_dir(self.disk.mapper().to_physical(&folder.full_path));

        info!(folder_id = %id, full_path = %folder.full_path, "Deleted folder");
        Ok(())
    }

    /// Run a reconciliation pass over a folder and wait for its report.
    pub async fn sync_now(&self, id: FolderId) -> AppResult<SyncReport> {
        let folder = self.get(id).await?;
        self.reconciler.schedule_with_report(&folder).wait().await
    }
}

fn validate_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    if !path::is_valid_segment(name) {
        return Err(AppError::validation(format!(
            "'{name}' is not a valid folder name"
        )));
    }
    Ok(name)
}
