//! Tag repository: tags and their folder/file associations.

use sqlx::PgPool;

use tagvault_core::error::{AppError, ErrorKind};
use tagvault_core::result::AppResult;
use tagvault_core::types::{FileId, FolderId, TagId};
use tagvault_entity::tag::{NewTag, Tag};

use super::map_write_error;

/// Repository for tag CRUD and tagging.
#[derive(Debug, Clone)]
pub struct TagRepository {
    pool: PgPool,
}

impl TagRepository {
    /// Create a new tag repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// List all tags.
    pub async fn find_all(&self) -> AppResult<Vec<Tag>> {
        sqlx::query_as::<_, Tag>("SELECT * FROM tags ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list tags", e))
    }

    /// Find a tag by ID.
    pub async fn find_by_id(&self, id: TagId) -> AppResult<Option<Tag>> {
        sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find tag", e))
    }

    /// Find a tag by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<Tag>> {
        sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find tag by slug", e)
            })
    }

    /// Create a new tag.
    pub async fn create(&self, data: &NewTag) -> AppResult<Tag> {
        sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (name, slug, color_hex) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&data.name)
        .bind(&data.slug)
        .bind(&data.color_hex)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "tag", format!("Tag '{}' already exists", data.slug)))
    }

    /// Delete a tag (associations cascade).
    pub async fn delete(&self, id: TagId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete tag", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Attach a tag to a folder.
    pub async fn attach_to_folder(&self, folder_id: FolderId, tag_id: TagId) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO folder_tags (folder_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(folder_id)
        .bind(tag_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "folder tag", "Folder tag already exists".to_string()))?;
        Ok(())
    }

    /// Detach a tag from a folder.
    pub async fn detach_from_folder(&self, folder_id: FolderId, tag_id: TagId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM folder_tags WHERE folder_id = $1 AND tag_id = $2")
            .bind(folder_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to detach folder tag", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Attach a tag to a file.
    pub async fn attach_to_file(&self, file_id: FileId, tag_id: TagId) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO file_tags (file_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(file_id)
        .bind(tag_id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "file tag", "File tag already exists".to_string()))?;
        Ok(())
    }

    /// Detach a tag from a file.
    pub async fn detach_from_file(&self, file_id: FileId, tag_id: TagId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM file_tags WHERE file_id = $1 AND tag_id = $2")
            .bind(file_id)
            .bind(tag_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to detach file tag", e)
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Tags attached to a folder.
    pub async fn find_for_folder(&self, folder_id: FolderId) -> AppResult<Vec<Tag>> {
        sqlx::query_as::<_, Tag>(
            "SELECT t.* FROM tags t INNER JOIN folder_tags gt ON gt.tag_id = t.id \
             WHERE gt.folder_id = $1 ORDER BY t.name ASC",
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list folder tags", e))
    }

    /// Tags attached to a file.
    pub async fn find_for_file(&self, file_id: FileId) -> AppResult<Vec<Tag>> {
        sqlx::query_as::<_, Tag>(
            "SELECT t.* FROM tags t INNER JOIN file_tags ft ON ft.tag_id = t.id \
             WHERE ft.file_id = $1 ORDER BY t.name ASC",
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list file tags", e))
    }
}
