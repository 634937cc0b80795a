//! # tagvault-service
//!
//! Business logic service layer for TagVault. The [`sync`] module keeps
//! the catalog in step with the physical tree; the remaining services
//! implement the user-facing folder, file, upload, search, and tag
//! operations on top of it.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time and are cheap to clone.

pub mod file;
pub mod folder;
pub mod sync;
pub mod tag;

#[cfg(test)]
mod testing;

pub use file::{
    DownloadResult, DownloadService, FileService, SearchRequest, SearchService, StagedUpload,
    UploadService,
};
pub use folder::{FolderContents, FolderService};
pub use sync::{Reconciler, StaleFilter, SyncReport};
pub use tag::TagService;
