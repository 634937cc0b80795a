//! Shared fixture for service tests: memory store, temporary upload root.

use std::path::PathBuf;
use std::sync::Arc;

use tagvault_core::config::StorageConfig;
use tagvault_database::{CatalogStore, MemoryCatalogStore};
use tagvault_entity::{File, Folder, NewFile, NewFolder};
use tagvault_storage::LocalDisk;
use tagvault_worker::{CleanupJobs, JobQueue};

use crate::file::{DownloadService, FileService, SearchService, UploadService};
use crate::folder::FolderService;
use crate::sync::{Reconciler, StaleFilter};
use crate::tag::TagService;

pub(crate) struct Fixture {
    _dir: tempfile::TempDir,
    pub config: StorageConfig,
    pub store: Arc<dyn CatalogStore>,
    pub disk: LocalDisk,
    pub queue: JobQueue,
    pub cleanup: CleanupJobs,
    pub reconciler: Reconciler,
    pub stale: StaleFilter,
    pub root: Folder,
}

impl Fixture {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::rooted_at(dir.path());
        let store: Arc<dyn CatalogStore> = Arc::new(MemoryCatalogStore::new());
        let disk = LocalDisk::new(&config.upload_root).await.unwrap();
        let queue = JobQueue::default();
        let cleanup = CleanupJobs::new(queue.clone(), Arc::clone(&store), disk.clone());
        let reconciler = Reconciler::new(Arc::clone(&store), disk.clone(), cleanup.clone());
        let stale = StaleFilter::new(disk.clone(), cleanup.clone());

        let root = store
            .insert_folder(&NewFolder {
                name: "root".into(),
                parent_id: None,
                full_path: "/root".into(),
            })
            .await
            .unwrap();
        disk.create_dir_all(&disk.mapper().to_physical("/root"))
            .await
            .unwrap();

        Self {
            _dir: dir,
            config,
            store,
            disk,
            queue,
            cleanup,
            reconciler,
            stale,
            root,
        }
    }

    pub fn folders(&self) -> FolderService {
        FolderService::new(
            Arc::clone(&self.store),
            self.disk.clone(),
            self.cleanup.clone(),
            self.reconciler.clone(),
            self.stale.clone(),
            &self.config,
        )
    }

    pub fn files(&self) -> FileService {
        FileService::new(Arc::clone(&self.store), self.cleanup.clone())
    }

    pub fn downloads(&self) -> DownloadService {
        DownloadService::new(Arc::clone(&self.store), self.disk.clone(), self.cleanup.clone())
    }

    pub fn search(&self) -> SearchService {
        SearchService::new(Arc::clone(&self.store), self.stale.clone())
    }

    pub fn uploads(&self) -> UploadService {
        UploadService::new(
            Arc::clone(&self.store),
            self.disk.clone(),
            self.cleanup.clone(),
            &self.config,
        )
    }

    pub fn tags(&self) -> TagService {
        TagService::new(Arc::clone(&self.store))
    }

    pub fn physical(&self, logical: &str) -> PathBuf {
        self.disk.mapper().to_physical(logical)
    }

    /// Write a file on disk only, creating its directories.
    pub fn write_file(&self, logical: &str, contents: &[u8]) {
        let path = self.physical(logical);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    /// Create a directory on disk only.
    pub fn mkdir(&self, logical: &str) {
        std::fs::create_dir_all(self.physical(logical)).unwrap();
    }

    pub async fn folder_at(&self, full_path: &str) -> Folder {
        self.store
            .find_folder_by_path(full_path)
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("no folder at {full_path}"))
    }

    /// Insert a folder record without touching disk.
    pub async fn insert_folder(&self, parent: &Folder, name: &str) -> Folder {
        self.store
            .insert_folder(&NewFolder::child_of(parent, name))
            .await
            .unwrap()
    }

    /// Insert a file record without touching disk.
    pub async fn insert_file(&self, folder: &Folder, name: &str) -> File {
        let path = self.physical(&folder.full_path).join(name);
        self.store
            .insert_file(&NewFile {
                folder_id: folder.id,
                name: name.into(),
                storage_path: path.to_string_lossy().into_owned(),
                size_bytes: 1,
                mime_type: None,
            })
            .await
            .unwrap()
    }
}
