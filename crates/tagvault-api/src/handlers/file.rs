//! File handlers: metadata, rename, delete, download, and tags.

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;

use tagvault_core::error::AppError;
use tagvault_core::types::{FileId, TagId};
use tagvault_entity::{File, Tag};

use super::{ApiResult, ok};
use crate::dto::request::{RenameRequest, validated};
use crate::dto::response::{FileDetails, MessageResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/files/{id}
pub async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<FileId>,
) -> ApiResult<FileDetails> {
    let file = state.file_service.get(id).await?;
    let tags = state.tag_service.tags_for_file(id).await?;
    ok(FileDetails { file, tags })
}

/// PUT /api/files/{id}
pub async fn rename_file(
    State(state): State<AppState>,
    Path(id): Path<FileId>,
    Json(req): Json<RenameRequest>,
) -> ApiResult<File> {
    let req = validated(req)?;
    ok(state.file_service.rename(id, &req.name).await?)
}

/// DELETE /api/files/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    Path(id): Path<FileId>,
) -> ApiResult<MessageResponse> {
    state.file_service.delete(id).await?;
    ok(MessageResponse::new("File deleted"))
}

/// GET /api/files/{id}/download
pub async fn download_file(
    State(state): State<AppState>,
    Path(id): Path<FileId>,
) -> Result<Response, ApiError> {
    let result = state.download_service.open_download(id).await?;

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, result.content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&result.filename),
        )
        .body(Body::from_stream(result.stream))
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")))?;

    Ok(response)
}

/// PUT /api/files/{id}/tags/{tag_id}
pub async fn attach_tag(
    State(state): State<AppState>,
    Path((id, tag_id)): Path<(FileId, TagId)>,
) -> ApiResult<Vec<Tag>> {
    state.tag_service.attach_to_file(id, tag_id).await?;
    ok(state.tag_service.tags_for_file(id).await?)
}

/// DELETE /api/files/{id}/tags/{tag_id}
pub async fn detach_tag(
    State(state): State<AppState>,
    Path((id, tag_id)): Path<(FileId, TagId)>,
) -> ApiResult<Vec<Tag>> {
    state.tag_service.detach_from_file(id, tag_id).await?;
    ok(state.tag_service.tags_for_file(id).await?)
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 name.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::with_capacity(filename.len());
    for byte in filename.bytes() {
        if byte.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
