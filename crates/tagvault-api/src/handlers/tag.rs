//! Tag handlers.

use axum::Json;
use axum::extract::{Path, State};

use tagvault_core::types::TagId;
use tagvault_entity::Tag;

use super::{ApiResult, ok};
use crate::dto::request::{CreateTagRequest, validated};
use crate::dto::response::MessageResponse;
use crate::state::AppState;

/// GET /api/tags
pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Vec<Tag>> {
    ok(state.tag_service.list().await?)
}

/// POST /api/tags
pub async fn create_tag(
    State(state): State<AppState>,
    Json(req): Json<CreateTagRequest>,
) -> ApiResult<Tag> {
    let req = validated(req)?;
    ok(state
        .tag_service
        .create(&req.name, req.color.as_deref())
        .await?)
}

/// DELETE /api/tags/{id}
pub async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<TagId>,
) -> ApiResult<MessageResponse> {
    state.tag_service.delete(id).await?;
    ok(MessageResponse::new("Tag deleted"))
}
