//! File repository implementation.

use sqlx::PgPool;

use tagvault_core::error::{AppError, ErrorKind};
use tagvault_core::result::AppResult;
use tagvault_core::types::{FileId, FolderId};
use tagvault_entity::file::{File, NewFile};

use super::map_write_error;
use crate::store::FileSearch;

/// Repository for file CRUD and search.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a file by ID.
    pub async fn find_by_id(&self, id: FileId) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    /// List files directly inside a folder.
    pub async fn find_by_folder(&self, folder_id: FolderId) -> AppResult<Vec<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE folder_id = $1 ORDER BY name ASC, id ASC",
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))
    }

    /// List files belonging to any of the given folders.
    pub async fn find_by_folders(&self, folder_ids: &[FolderId]) -> AppResult<Vec<File>> {
        if folder_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE folder_id = ANY($1) ORDER BY storage_path ASC",
        )
        .bind(folder_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list files for folders", e)
        })
    }

    /// Create a new file record.
    pub async fn create(&self, data: &NewFile) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "INSERT INTO files (folder_id, name, storage_path, size_bytes, mime_type) \
             VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(data.folder_id)
        .bind(&data.name)
        .bind(&data.storage_path)
        .bind(data.size_bytes)
        .bind(&data.mime_type)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                "file",
                format!("A file is already stored at '{}'", data.storage_path),
            )
        })
    }

    /// Change a file's display name.
    pub async fn rename(&self, id: FileId, name: &str) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET name = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to rename file", e))
    }

    /// Rewrite the storage path of every file beneath a physical directory.
    pub async fn rewrite_storage_prefix(
        &self,
        old_prefix: &str,
        new_prefix: &str,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE files SET storage_path = $2 || substr(storage_path, length($1) + 1), \
             updated_at = NOW() \
             WHERE starts_with(storage_path, $1 || '/')",
        )
        .bind(old_prefix)
        .bind(new_prefix)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                "file storage paths",
                format!("A file is already stored under '{new_prefix}'"),
            )
        })?;
        Ok(result.rows_affected())
    }

    /// Delete a file record.
    pub async fn delete(&self, id: FileId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete file", e))?;
        Ok(result.rows_affected() > 0)
    }

    /// Search by display name and tag.
    ///
    /// A tag matches when it is attached to the file itself or to any
    /// folder whose path contains the file's folder.
    pub async fn search(&self, query: &FileSearch) -> AppResult<Vec<File>> {
        let pattern = query.text.as_deref().map(like_pattern);
        sqlx::query_as::<_, File>(
            "SELECT f.* FROM files f \
             INNER JOIN folders d ON d.id = f.folder_id \
             WHERE ($1::text IS NULL OR f.name ILIKE $1 ESCAPE '\\') \
             AND ($2::text IS NULL \
                  OR EXISTS (SELECT 1 FROM file_tags ft \
                             INNER JOIN tags t ON t.id = ft.tag_id \
                             WHERE ft.file_id = f.id AND t.slug = $2) \
                  OR EXISTS (SELECT 1 FROM folder_tags gt \
                             INNER JOIN tags t ON t.id = gt.tag_id \
                             INNER JOIN folders a ON a.id = gt.folder_id \
                             WHERE t.slug = $2 \
                             AND (d.full_path = a.full_path \
                                  OR starts_with(d.full_path, a.full_path || '/')))) \
             ORDER BY f.name ASC, f.id ASC \
             LIMIT $3",
        )
        .bind(pattern)
        .bind(&query.tag_slug)
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to search files", e))
    }
}

/// Wrap user text as a literal `ILIKE` substring pattern.
fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
