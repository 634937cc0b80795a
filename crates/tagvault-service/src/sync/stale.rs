//! Per-read existence filtering of catalog rows.

use std::path::Path;

use futures::future::join_all;
use tracing::debug;

use tagvault_entity::{File, Folder};
use tagvault_storage::LocalDisk;
use tagvault_worker::CleanupJobs;

/// Drops rows whose physical counterpart is gone and schedules their removal.
///
/// Each row is probed independently of any reconciliation in flight; a
/// row that fails the probe is left out of the response and exactly one
/// cleanup job is queued for it.
#[derive(Debug, Clone)]
pub struct StaleFilter {
    disk: LocalDisk,
    cleanup: CleanupJobs,
}

impl StaleFilter {
    /// Creates a new stale filter.
    pub fn new(disk: LocalDisk, cleanup: CleanupJobs) -> Self {
        Self { disk, cleanup }
    }

    /// Keep the folders whose directory still exists.
    pub async fn folders(&self, folders: Vec<Folder>) -> Vec<Folder> {
        let mapper = self.disk.mapper();
        let probes = folders.iter().map(|folder| {
            let physical = mapper.to_physical(&folder.full_path);
            async move { folder.is_root() || self.disk.dir_exists(&physical).await }
        });
        let present = join_all(probes).await;

        folders
            .into_iter()
            .zip(present)
            .filter_map(|(folder, present)| {
                if present {
                    return Some(folder);
                }
                debug!(
                    folder_id = %folder.id,
                    full_path = %folder.full_path,
                    "Dropping stale folder row"
                );
                self.cleanup.remove_folder_record(folder.id);
                None
            })
            .collect()
    }

    /// Keep the files whose physical file still exists.
    pub async fn files(&self, files: Vec<File>) -> Vec<File> {
        let probes = files
            .iter()
            .map(|file| self.disk.file_exists(Path::new(&file.storage_path)));
        let present = join_all(probes).await;

        files
            .into_iter()
            .zip(present)
            .filter_map(|(file, present)| {
                if present {
                    return Some(file);
                }
                debug!(
                    file_id = %file.id,
                    storage_path = %file.storage_path,
                    "Dropping stale file row"
                );
                self.cleanup.remove_file_record(file.id);
                None
            })
            .collect()
    }
}
