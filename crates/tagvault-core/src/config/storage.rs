//! Physical file tree configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where folders and files live on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Fixed physical root that logical folder paths are mapped under.
    #[serde(default = "default_upload_root")]
    pub upload_root: String,
    /// Directory where incoming upload bytes are staged before placement.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: String,
    /// Name of the single root folder (its logical path is `/<name>`).
    #[serde(default = "default_root_folder_name")]
    pub root_folder_name: String,
    /// Maximum upload size in bytes (default 5 GB).
    #[serde(default = "default_max_upload")]
    pub max_upload_size_bytes: u64,
}

impl StorageConfig {
    /// Build a configuration whose directories all live under `base`.
    pub fn rooted_at(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            upload_root: base.join("files").display().to_string(),
            staging_dir: base.join("staging").display().to_string(),
            ..Self::default()
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_root: default_upload_root(),
            staging_dir: default_staging_dir(),
            root_folder_name: default_root_folder_name(),
            max_upload_size_bytes: default_max_upload(),
        }
    }
}

fn default_upload_root() -> String {
    "./data/files".to_string()
}

fn default_staging_dir() -> String {
    "./data/staging".to_string()
}

fn default_root_folder_name() -> String {
    "root".to_string()
}

fn default_max_upload() -> u64 {
    5_368_709_120 // 5 GB
}
