//! File management: CRUD, download, search, upload.

pub mod download;
pub mod search;
pub mod service;
pub mod upload;

pub use download::{DownloadResult, DownloadService};
pub use search::{SearchRequest, SearchService};
pub use service::FileService;
pub use upload::{StagedUpload, UploadService};
