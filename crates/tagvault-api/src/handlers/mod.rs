//! HTTP handlers, one module per resource.

pub mod file;
pub mod folder;
pub mod health;
pub mod search;
pub mod tag;

use axum::Json;

use crate::dto::response::ApiResponse;
use crate::error::ApiError;

/// Handler result wrapped in the standard success envelope.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wrap `data` in the success envelope.
pub fn ok<T: serde::Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data)))
}
