//! Folder handlers: listing, CRUD, sync, upload, and tags.

use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;

use tagvault_core::error::AppError;
use tagvault_core::types::{FolderId, TagId};
use tagvault_entity::{File, Folder, Tag};
use tagvault_service::{FolderContents, SyncReport};

use super::{ApiResult, ok};
use crate::dto::request::{CreateFolderRequest, RenameRequest, validated};
use crate::dto::response::MessageResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/folders/root
pub async fn get_root(State(state): State<AppState>) -> ApiResult<FolderContents> {
    let root = state.folder_service.root().await?;
    ok(state.folder_service.list_contents(root.id).await?)
}

/// GET /api/folders/{id}
pub async fn get_folder(
    State(state): State<AppState>,
    Path(id): Path<FolderId>,
) -> ApiResult<FolderContents> {
    ok(state.folder_service.list_contents(id).await?)
}

/// POST /api/folders
pub async fn create_folder(
    State(state): State<AppState>,
    Json(req): Json<CreateFolderRequest>,
) -> ApiResult<Folder> {
    let req = validated(req)?;
    ok(state.folder_service.create(req.parent_id, &req.name).await?)
}

/// PUT /api/folders/{id}
pub async fn rename_folder(
    State(state): State<AppState>,
    Path(id): Path<FolderId>,
    Json(req): Json<RenameRequest>,
) -> ApiResult<Folder> {
    let req = validated(req)?;
    ok(state.folder_service.rename(id, &req.name).await?)
}

/// DELETE /api/folders/{id}
pub async fn delete_folder(
    State(state): State<AppState>,
    Path(id): Path<FolderId>,
) -> ApiResult<MessageResponse> {
    state.folder_service.delete(id).await?;
    ok(MessageResponse::new("Folder deleted"))
}

/// POST /api/folders/{id}/sync
pub async fn sync_folder(
    State(state): State<AppState>,
    Path(id): Path<FolderId>,
) -> ApiResult<SyncReport> {
    ok(state.folder_service.sync_now(id).await?)
}

/// POST /api/folders/{id}/upload
///
/// Every file part is one item; its filename is the item's path
/// relative to the target folder. Parts without a filename are ignored.
pub async fn upload(
    State(state): State<AppState>,
    Path(id): Path<FolderId>,
    mut multipart: Multipart,
) -> ApiResult<Vec<File>> {
    state.folder_service.get(id).await?;

    let mut staged = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                state.upload_service.discard(&staged).await;
                let err = if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                    AppError::payload_too_large(e.body_text())
                } else {
                    AppError::validation(format!("Multipart error: {}", e.body_text()))
                };
                return Err(ApiError(err));
            }
        };

        let Some(relative_path) = field.file_name().map(str::to_string) else {
            continue;
        };

        match state.upload_service.stage(&relative_path, field).await {
            Ok(item) => staged.push(item),
            Err(e) => {
                state.upload_service.discard(&staged).await;
                return Err(ApiError(e));
            }
        }
    }

    if staged.is_empty() {
        return Err(ApiError(AppError::validation("Upload contained no files")));
    }

    ok(state.upload_service.finalize(id, staged).await?)
}

/// GET /api/folders/{id}/tags
pub async fn list_tags(
    State(state): State<AppState>,
    Path(id): Path<FolderId>,
) -> ApiResult<Vec<Tag>> {
    ok(state.tag_service.tags_for_folder(id).await?)
}

/// PUT /api/folders/{id}/tags/{tag_id}
pub async fn attach_tag(
    State(state): State<AppState>,
    Path((id, tag_id)): Path<(FolderId, TagId)>,
) -> ApiResult<Vec<Tag>> {
    state.tag_service.attach_to_folder(id, tag_id).await?;
    ok(state.tag_service.tags_for_folder(id).await?)
}

/// DELETE /api/folders/{id}/tags/{tag_id}
pub async fn detach_tag(
    State(state): State<AppState>,
    Path((id, tag_id)): Path<(FolderId, TagId)>,
) -> ApiResult<Vec<Tag>> {
    state.tag_service.detach_from_folder(id, tag_id).await?;
    ok(state.tag_service.tags_for_folder(id).await?)
}
