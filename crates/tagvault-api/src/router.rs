//! Route definitions for the TagVault HTTP API.
//!
//! All routes are organized by resource and mounted under `/api`.
//! The router receives `AppState` and passes it to all handlers via Axum's `State` extractor.

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};

use crate::handlers;
use crate::state::AppState;

/// Build the API router with every route and the upload body limit.
pub fn build_router(state: AppState) -> Router {
    let max_upload =
        usize::try_from(state.config.storage.max_upload_size_bytes).unwrap_or(usize::MAX);

    let api_routes = Router::new()
        .merge(health_routes())
        .merge(folder_routes())
        .merge(file_routes())
        .merge(tag_routes())
        .merge(search_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_upload))
        .with_state(state)
}

/// Liveness and queue stats
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// Folder listing, CRUD, sync, upload, tags
fn folder_routes() -> Router<AppState> {
    Router::new()
        .route("/folders", post(handlers::folder::create_folder))
        .route("/folders/root", get(handlers::folder::get_root))
        .route(
            "/folders/{id}",
            get(handlers::folder::get_folder)
                .put(handlers::folder::rename_folder)
                .delete(handlers::folder::delete_folder),
        )
        .route("/folders/{id}/sync", post(handlers::folder::sync_folder))
        .route("/folders/{id}/upload", post(handlers::folder::upload))
        .route("/folders/{id}/tags", get(handlers::folder::list_tags))
        .route(
            "/folders/{id}/tags/{tag_id}",
            put(handlers::folder::attach_tag).delete(handlers::folder::detach_tag),
        )
}

/// File metadata, download, tags
fn file_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/files/{id}",
            get(handlers::file::get_file)
                .put(handlers::file::rename_file)
                .delete(handlers::file::delete_file),
        )
        .route("/files/{id}/download", get(handlers::file::download_file))
        .route(
            "/files/{id}/tags/{tag_id}",
            put(handlers::file::attach_tag).delete(handlers::file::detach_tag),
        )
}

/// Tag CRUD
fn tag_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/tags",
            get(handlers::tag::list_tags).post(handlers::tag::create_tag),
        )
        .route("/tags/{id}", axum::routing::delete(handlers::tag::delete_tag))
}

/// Name and tag search
fn search_routes() -> Router<AppState> {
    Router::new().route("/search", get(handlers::search::search_files))
}
