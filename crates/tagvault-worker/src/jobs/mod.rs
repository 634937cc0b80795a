//! Built-in background jobs.

pub mod cleanup;

use std::path::PathBuf;
use std::sync::Arc;

use tagvault_core::types::{FileId, FolderId};
use tagvault_database::CatalogStore;
use tagvault_storage::LocalDisk;

use crate::queue::JobQueue;

/// Schedules cleanup jobs on the shared queue.
#[derive(Debug, Clone)]
pub struct CleanupJobs {
    queue: JobQueue,
    store: Arc<dyn CatalogStore>,
    disk: LocalDisk,
}

impl CleanupJobs {
    /// Create a scheduler bound to a queue, store, and disk.
    pub fn new(queue: JobQueue, store: Arc<dyn CatalogStore>, disk: LocalDisk) -> Self {
        Self { queue, store, disk }
    }

    /// The queue jobs are scheduled on.
    pub fn queue(&self) -> &JobQueue {
        &self.queue
    }

    /// Schedule removal of a file record whose physical file vanished.
    pub fn remove_file_record(&self, file_id: FileId) {
        let (store, disk) = (Arc::clone(&self.store), self.disk.clone());
        self.queue.enqueue("remove_file_record", async move {
            cleanup::remove_file_record(store.as_ref(), &disk, file_id).await
        });
    }

    /// Schedule removal of a folder record whose directory vanished.
    pub fn remove_folder_record(&self, folder_id: FolderId) {
        let (store, disk) = (Arc::clone(&self.store), self.disk.clone());
        self.queue.enqueue("remove_folder_record", async move {
            cleanup::remove_folder_record(store.as_ref(), &disk, folder_id).await
        });
    }

    /// Schedule unlinking a physical file.
    pub fn unlink_file(&self, path: PathBuf) {
        let disk = self.disk.clone();
        self.queue.enqueue("unlink_file", async move {
            cleanup::unlink_file(&disk, &path).await
        });
    }

    /// Schedule removal of a physical directory tree.
    pub fn remove_dir(&self, path: PathBuf) {
        let disk = self.disk.clone();
        self.queue.enqueue("remove_dir", async move {
            cleanup::remove_dir(&disk, &path).await
        });
    }

    /// Schedule a physical rename.
    pub fn rename_path(&self, from: PathBuf, to: PathBuf) {
        let disk = self.disk.clone();
        self.queue.enqueue("rename_path", async move {
            cleanup::rename_path(&disk, &from, &to).await
        });
    }
}
