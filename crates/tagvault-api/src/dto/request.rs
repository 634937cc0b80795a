//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use tagvault_core::error::AppError;
use tagvault_core::types::FolderId;

/// Create folder request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateFolderRequest {
    /// Parent folder ID.
    pub parent_id: FolderId,
    /// Folder name.
    #[validate(length(min = 1, max = 255, message = "Folder name must be 1-255 characters"))]
    pub name: String,
}

/// Rename request for folders and files.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RenameRequest {
    /// New name.
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
}

/// Create tag request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTagRequest {
    /// Tag name.
    #[validate(length(min = 1, max = 100, message = "Tag name must be 1-100 characters"))]
    pub name: String,
    /// Display color as `#rrggbb`.
    #[validate(length(min = 6, max = 7, message = "Color must be #rrggbb"))]
    pub color: Option<String>,
}

/// Search query parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct SearchParams {
    /// Substring of the file name.
    #[validate(length(max = 255))]
    pub q: Option<String>,
    /// Tag name or slug.
    #[validate(length(max = 100))]
    pub tag: Option<String>,
    /// Maximum number of results.
    #[validate(range(min = 1, max = 200))]
    pub limit: Option<i64>,
}

/// Run `validator` checks, mapping failures to a validation error.
pub fn validated<T: Validate>(req: T) -> Result<T, AppError> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    Ok(req)
}
