//! Folder repository implementation.

use sqlx::PgPool;

use tagvault_core::error::{AppError, ErrorKind};
use tagvault_core::result::AppResult;
use tagvault_core::types::FolderId;
use tagvault_entity::folder::{Folder, NewFolder};

use super::map_write_error;

/// Folder columns plus the derived `has_children` flag.
const FOLDER_SELECT: &str = "SELECT f.id, f.name, f.parent_id, f.full_path, \
     EXISTS (SELECT 1 FROM folders c WHERE c.parent_id = f.id) AS has_children, \
     f.created_at, f.updated_at \
     FROM folders f";

/// Repository for folder CRUD and subtree queries.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the root folder.
    pub async fn find_root(&self) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(&format!(
            "{FOLDER_SELECT} WHERE f.parent_id IS NULL ORDER BY f.id ASC LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find root folder", e))
    }

    /// Find a folder by ID.
    pub async fn find_by_id(&self, id: FolderId) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(&format!("{FOLDER_SELECT} WHERE f.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    /// Find a folder by its full path.
    pub async fn find_by_path(&self, full_path: &str) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>(&format!("{FOLDER_SELECT} WHERE f.full_path = $1"))
            .bind(full_path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find folder by path", e)
            })
    }

    /// List direct children of a folder.
    pub async fn find_children(&self, parent_id: FolderId) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(&format!(
            "{FOLDER_SELECT} WHERE f.parent_id = $1 ORDER BY f.name ASC"
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list children", e))
    }

    /// The folder at `full_path` and every folder beneath it.
    pub async fn find_subtree(&self, full_path: &str) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(&format!(
            "{FOLDER_SELECT} WHERE f.full_path = $1 OR starts_with(f.full_path, $1 || '/') \
             ORDER BY length(f.full_path) ASC, f.full_path ASC"
        ))
        .bind(full_path)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list subtree", e))
    }

    /// Get the ancestor chain from the root down to a folder.
    pub async fn find_ancestors(&self, folder_id: FolderId) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "WITH RECURSIVE ancestors AS ( \
                SELECT * FROM folders WHERE id = $1 \
                UNION ALL \
                SELECT f.* FROM folders f INNER JOIN ancestors a ON f.id = a.parent_id \
             ) SELECT a.id, a.name, a.parent_id, a.full_path, \
               EXISTS (SELECT 1 FROM folders c WHERE c.parent_id = a.id) AS has_children, \
               a.created_at, a.updated_at \
               FROM ancestors a ORDER BY length(a.full_path) ASC",
        )
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find ancestors", e))
    }

    /// Create a new folder.
    pub async fn create(&self, data: &NewFolder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (name, parent_id, full_path) VALUES ($1, $2, $3) \
             RETURNING id, name, parent_id, full_path, FALSE AS has_children, \
             created_at, updated_at",
        )
        .bind(&data.name)
        .bind(data.parent_id)
        .bind(&data.full_path)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                "folder",
                format!("Folder path '{}' already exists", data.full_path),
            )
        })
    }

    /// Rename a folder and rewrite the paths of all descendants.
    pub async fn rename(
        &self,
        folder_id: FolderId,
        new_name: &str,
        new_path: &str,
    ) -> AppResult<Option<Folder>> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let old_path: Option<String> =
            sqlx::query_scalar("SELECT full_path FROM folders WHERE id = $1 FOR UPDATE")
                .bind(folder_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to lock folder", e)
                })?;

        let Some(old_path) = old_path else {
            return Ok(None);
        };

        sqlx::query(
            "UPDATE folders SET full_path = $2 || substr(full_path, length($1) + 1), \
             updated_at = NOW() \
             WHERE full_path = $1 OR starts_with(full_path, $1 || '/')",
        )
        .bind(&old_path)
        .bind(new_path)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            map_write_error(
                e,
                "folder paths",
                format!("Folder path '{new_path}' already exists"),
            )
        })?;

        sqlx::query("UPDATE folders SET name = $2 WHERE id = $1")
            .bind(folder_id)
            .bind(new_name)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to rename folder", e)
            })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit folder rename", e)
        })?;

        self.find_by_id(folder_id).await
    }

    /// Delete a folder (cascades to children, files, and tag links).
    pub async fn delete(&self, folder_id: FolderId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM folders WHERE id = $1")
            .bind(folder_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to delete folder", e)
            })?;
        Ok(result.rows_affected() > 0)
    }
}
