//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use tagvault_core::config::AppConfig;
use tagvault_core::result::AppResult;
use tagvault_database::CatalogStore;
use tagvault_service::{
    DownloadService, FileService, FolderService, Reconciler, SearchService, StaleFilter,
    TagService, UploadService,
};
use tagvault_storage::LocalDisk;
use tagvault_worker::{CleanupJobs, JobQueue};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are cheap to clone across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Process start, for uptime reporting
    pub started_at: Instant,

    // ── Infrastructure ───────────────────────────────────────
    /// Catalog store
    pub store: Arc<dyn CatalogStore>,
    /// Physical file tree
    pub disk: LocalDisk,
    /// Background job queue
    pub queue: JobQueue,
    /// Reconciliation scheduler
    pub reconciler: Reconciler,

    // ── Services ─────────────────────────────────────────────
    /// Folder service
    pub folder_service: Arc<FolderService>,
    /// File service
    pub file_service: Arc<FileService>,
    /// Download service
    pub download_service: Arc<DownloadService>,
    /// Search service
    pub search_service: Arc<SearchService>,
    /// Upload service
    pub upload_service: Arc<UploadService>,
    /// Tag service
    pub tag_service: Arc<TagService>,
}

impl AppState {
    /// Wire the services on top of a catalog store.
    pub async fn build(config: AppConfig, store: Arc<dyn CatalogStore>) -> AppResult<Self> {
        let disk = LocalDisk::new(&config.storage.upload_root).await?;
        let queue = JobQueue::from_config(&config.worker);
        let cleanup = CleanupJobs::new(queue.clone(), Arc::clone(&store), disk.clone());
        let reconciler = Reconciler::new(Arc::clone(&store), disk.clone(), cleanup.clone());
        let stale = StaleFilter::new(disk.clone(), cleanup.clone());

        let folder_service = Arc::new(FolderService::new(
            Arc::clone(&store),
            disk.clone(),
            cleanup.clone(),
            reconciler.clone(),
            stale.clone(),
            &config.storage,
        ));
        let file_service = Arc::new(FileService::new(Arc::clone(&store), cleanup.clone()));
        let download_service = Arc::new(DownloadService::new(
            Arc::clone(&store),
            disk.clone(),
            cleanup.clone(),
        ));
        let search_service = Arc::new(SearchService::new(Arc::clone(&store), stale));
        let upload_service = Arc::new(UploadService::new(
            Arc::clone(&store),
            disk.clone(),
            cleanup,
            &config.storage,
        ));
        let tag_service = Arc::new(TagService::new(Arc::clone(&store)));

        Ok(Self {
            config: Arc::new(config),
            started_at: Instant::now(),
            store,
            disk,
            queue,
            reconciler,
            folder_service,
            file_service,
            download_service,
            search_service,
            upload_service,
            tag_service,
        })
    }
}
