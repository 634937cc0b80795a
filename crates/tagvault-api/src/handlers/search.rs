//! File search handler.

use axum::extract::{Query, State};

use tagvault_entity::File;
use tagvault_service::SearchRequest;

use super::{ApiResult, ok};
use crate::dto::request::{SearchParams, validated};
use crate::state::AppState;

/// GET /api/search?q=...&tag=...&limit=...
pub async fn search_files(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<File>> {
    let params = validated(params)?;
    let files = state
        .search_service
        .search(SearchRequest {
            query: params.q,
            tag: params.tag,
            limit: params.limit,
        })
        .await?;
    ok(files)
}
