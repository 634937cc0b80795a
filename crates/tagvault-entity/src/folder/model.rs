//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use tagvault_core::types::FolderId;

/// A folder in the catalog hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: FolderId,
    /// Folder name (last segment of `full_path`).
    pub name: String,
    /// Parent folder ID (null only for the single root).
    pub parent_id: Option<FolderId>,
    /// Full logical path (e.g., `/root/photos/2023`).
    pub full_path: String,
    /// Whether at least one child folder exists. Derived at query time.
    #[sqlx(default)]
    pub has_children: bool,
    /// When the folder record was created.
    pub created_at: DateTime<Utc>,
    /// When the folder record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Check if this is the root folder (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data required to insert a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFolder {
    /// Folder name.
    pub name: String,
    /// Parent folder (None only for the root).
    pub parent_id: Option<FolderId>,
    /// Full logical path.
    pub full_path: String,
}

impl NewFolder {
    /// Build the insert payload for a child of `parent`.
    pub fn child_of(parent: &Folder, name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent_id: Some(parent.id),
            full_path: super::path::join(&parent.full_path, name),
        }
    }
}
