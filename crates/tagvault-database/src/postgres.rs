//! PostgreSQL-backed catalog store.

use async_trait::async_trait;
use sqlx::PgPool;

use tagvault_core::result::AppResult;
use tagvault_core::types::{FileId, FolderId, TagId};
use tagvault_entity::{File, Folder, NewFile, NewFolder, NewTag, Tag};

use crate::repositories::{FileRepository, FolderRepository, TagRepository};
use crate::store::{CatalogStore, FileSearch};

/// [`CatalogStore`] over the folder, file, and tag repositories.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    folders: FolderRepository,
    files: FileRepository,
    tags: TagRepository,
}

impl PgCatalogStore {
    /// Build all repositories on a shared pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            folders: FolderRepository::new(pool.clone()),
            files: FileRepository::new(pool.clone()),
            tags: TagRepository::new(pool),
        }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn root_folder(&self) -> AppResult<Option<Folder>> {
        self.folders.find_root().await
    }

    async fn find_folder(&self, id: FolderId) -> AppResult<Option<Folder>> {
        self.folders.find_by_id(id).await
    }

    async fn find_folder_by_path(&self, full_path: &str) -> AppResult<Option<Folder>> {
        self.folders.find_by_path(full_path).await
    }

    async fn list_child_folders(&self, parent_id: FolderId) -> AppResult<Vec<Folder>> {
        self.folders.find_children(parent_id).await
    }

    async fn list_subtree_folders(&self, full_path: &str) -> AppResult<Vec<Folder>> {
        self.folders.find_subtree(full_path).await
    }

    async fn list_ancestors(&self, id: FolderId) -> AppResult<Vec<Folder>> {
        self.folders.find_ancestors(id).await
    }

    async fn insert_folder(&self, data: &NewFolder) -> AppResult<Folder> {
        self.folders.create(data).await
    }

    async fn rename_folder(
        &self,
        id: FolderId,
        name: &str,
        new_full_path: &str,
    ) -> AppResult<Option<Folder>> {
        self.folders.rename(id, name, new_full_path).await
    }

    async fn delete_folder(&self, id: FolderId) -> AppResult<bool> {
        self.folders.delete(id).await
    }

    async fn find_file(&self, id: FileId) -> AppResult<Option<File>> {
        self.files.find_by_id(id).await
    }

    async fn list_files_in_folder(&self, folder_id: FolderId) -> AppResult<Vec<File>> {
        self.files.find_by_folder(folder_id).await
    }

    async fn list_files_in_folders(&self, folder_ids: &[FolderId]) -> AppResult<Vec<File>> {
        self.files.find_by_folders(folder_ids).await
    }

    async fn insert_file(&self, data: &NewFile) -> AppResult<File> {
        self.files.create(data).await
    }

    async fn rename_file(&self, id: FileId, name: &str) -> AppResult<Option<File>> {
        self.files.rename(id, name).await
    }

    async fn rewrite_storage_prefix(&self, old_prefix: &str, new_prefix: &str) -> AppResult<u64> {
        self.files.rewrite_storage_prefix(old_prefix, new_prefix).await
    }

    async fn delete_file(&self, id: FileId) -> AppResult<bool> {
        self.files.delete(id).await
    }

    async fn search_files(&self, query: &FileSearch) -> AppResult<Vec<File>> {
        self.files.search(query).await
    }

    async fn list_tags(&self) -> AppResult<Vec<Tag>> {
        self.tags.find_all().await
    }

    async fn find_tag(&self, id: TagId) -> AppResult<Option<Tag>> {
        self.tags.find_by_id(id).await
    }

    async fn find_tag_by_slug(&self, slug: &str) -> AppResult<Option<Tag>> {
        self.tags.find_by_slug(slug).await
    }

    async fn insert_tag(&self, data: &NewTag) -> AppResult<Tag> {
        self.tags.create(data).await
    }

    async fn delete_tag(&self, id: TagId) -> AppResult<bool> {
        self.tags.delete(id).await
    }

    async fn tag_folder(&self, folder_id: FolderId, tag_id: TagId) -> AppResult<()> {
        self.tags.attach_to_folder(folder_id, tag_id).await
    }

    async fn untag_folder(&self, folder_id: FolderId, tag_id: TagId) -> AppResult<bool> {
        self.tags.detach_from_folder(folder_id, tag_id).await
    }

    async fn tag_file(&self, file_id: FileId, tag_id: TagId) -> AppResult<()> {
        self.tags.attach_to_file(file_id, tag_id).await
    }

    async fn untag_file(&self, file_id: FileId, tag_id: TagId) -> AppResult<bool> {
        self.tags.detach_from_file(file_id, tag_id).await
    }

    async fn tags_for_folder(&self, folder_id: FolderId) -> AppResult<Vec<Tag>> {
        self.tags.find_for_folder(folder_id).await
    }

    async fn tags_for_file(&self, file_id: FileId) -> AppResult<Vec<Tag>> {
        self.tags.find_for_file(file_id).await
    }
}
