//! The catalog store contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use tagvault_core::result::AppResult;
use tagvault_core::types::{FileId, FolderId, TagId};
use tagvault_entity::{File, Folder, NewFile, NewFolder, NewTag, Tag};

/// File search criteria. Both filters are optional and combine with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSearch {
    /// Case-insensitive substring of the display name.
    pub text: Option<String>,
    /// Tag slug, matched on the file itself or on any ancestor folder.
    pub tag_slug: Option<String>,
    /// Maximum number of results.
    pub limit: i64,
}

/// Folder, file, and tag persistence keyed by integer identity.
///
/// Every lookup by an id that does not exist returns `None`, an empty
/// list, or `false`. Implementations never fail because a record is
/// already gone.
#[async_trait]
pub trait CatalogStore: Send + Sync + std::fmt::Debug + 'static {
    /// The single folder without a parent, if created yet.
    async fn root_folder(&self) -> AppResult<Option<Folder>>;

    /// Find a folder by ID.
    async fn find_folder(&self, id: FolderId) -> AppResult<Option<Folder>>;

    /// Find a folder by its full logical path.
    async fn find_folder_by_path(&self, full_path: &str) -> AppResult<Option<Folder>>;

    /// Direct children of a folder, ordered by name.
    async fn list_child_folders(&self, parent_id: FolderId) -> AppResult<Vec<Folder>>;

    /// The folder at `full_path` and all of its descendants.
    async fn list_subtree_folders(&self, full_path: &str) -> AppResult<Vec<Folder>>;

    /// Ancestor chain from the root down to and including `id`.
    async fn list_ancestors(&self, id: FolderId) -> AppResult<Vec<Folder>>;

    /// Insert a folder. A duplicate `full_path` is a conflict.
    async fn insert_folder(&self, data: &NewFolder) -> AppResult<Folder>;

    /// Rename a folder and rewrite every descendant path by prefix.
    async fn rename_folder(
        &self,
        id: FolderId,
        name: &str,
        new_full_path: &str,
    ) -> AppResult<Option<Folder>>;

    /// Delete a folder with its descendants, their files, and tag links.
    async fn delete_folder(&self, id: FolderId) -> AppResult<bool>;

    /// Find a file by ID.
    async fn find_file(&self, id: FileId) -> AppResult<Option<File>>;

    /// Files directly inside a folder, ordered by name.
    async fn list_files_in_folder(&self, folder_id: FolderId) -> AppResult<Vec<File>>;

    /// Files belonging to any of the given folders.
    async fn list_files_in_folders(&self, folder_ids: &[FolderId]) -> AppResult<Vec<File>>;

    /// Insert a file. A duplicate `storage_path` is a conflict.
    async fn insert_file(&self, data: &NewFile) -> AppResult<File>;

    /// Change a file's display name.
    async fn rename_file(&self, id: FileId, name: &str) -> AppResult<Option<File>>;

    /// Rewrite `storage_path` for every file under a physical directory.
    async fn rewrite_storage_prefix(&self, old_prefix: &str, new_prefix: &str) -> AppResult<u64>;

    /// Delete a file and its tag links.
    async fn delete_file(&self, id: FileId) -> AppResult<bool>;

    /// Search files by name and/or tag.
    async fn search_files(&self, query: &FileSearch) -> AppResult<Vec<File>>;

    /// All tags ordered by name.
    async fn list_tags(&self) -> AppResult<Vec<Tag>>;

    /// Find a tag by ID.
    async fn find_tag(&self, id: TagId) -> AppResult<Option<Tag>>;

    /// Find a tag by slug.
    async fn find_tag_by_slug(&self, slug: &str) -> AppResult<Option<Tag>>;

    /// Insert a tag. A duplicate slug is a conflict.
    async fn insert_tag(&self, data: &NewTag) -> AppResult<Tag>;

    /// Delete a tag and every association to it.
    async fn delete_tag(&self, id: TagId) -> AppResult<bool>;

    /// Attach a tag to a folder. Attaching twice is a no-op.
    async fn tag_folder(&self, folder_id: FolderId, tag_id: TagId) -> AppResult<()>;

    /// Detach a tag from a folder.
    async fn untag_folder(&self, folder_id: FolderId, tag_id: TagId) -> AppResult<bool>;

    /// Attach a tag to a file. Attaching twice is a no-op.
    async fn tag_file(&self, file_id: FileId, tag_id: TagId) -> AppResult<()>;

    /// Detach a tag from a file.
    async fn untag_file(&self, file_id: FileId, tag_id: TagId) -> AppResult<bool>;

    /// Tags attached to a folder.
    async fn tags_for_folder(&self, folder_id: FolderId) -> AppResult<Vec<Tag>>;

    /// Tags attached to a file.
    async fn tags_for_file(&self, file_id: FileId) -> AppResult<Vec<Tag>>;
}
