//! File search by name and tag.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use tagvault_core::result::AppResult;
use tagvault_database::{CatalogStore, FileSearch};
use tagvault_entity::File;
use tagvault_entity::tag::slugify;

use crate::sync::StaleFilter;

/// Default number of results.
pub const DEFAULT_LIMIT: i64 = 50;

/// Upper bound on the number of results.
pub const MAX_LIMIT: i64 = 200;

/// Search request parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Substring of the display name.
    pub query: Option<String>,
    /// Tag name or slug.
    pub tag: Option<String>,
    /// Maximum number of results.
    pub limit: Option<i64>,
}

/// File search service.
#[derive(Debug, Clone)]
pub struct SearchService {
    /// Catalog store.
    store: Arc<dyn CatalogStore>,
    /// Per-read existence filter.
    stale: StaleFilter,
}

impl SearchService {
    /// Creates a new search service.
    pub fn new(store: Arc<dyn CatalogStore>, stale: StaleFilter) -> Self {
        Self { store, stale }
    }

    /// Search files. With neither a query nor a tag, nothing matches.
    pub async fn search(&self, req: SearchRequest) -> AppResult<Vec<File>> {
        let text = req
            .query
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty());
        let tag_slug = req.tag.map(|t| slugify(&t)).filter(|s| !s.is_empty());
        if text.is_none() && tag_slug.is_none() {
            return Ok(Vec::new());
        }

        let query = FileSearch {
            text,
            tag_slug,
            limit: req.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        };
        let files = self.store.search_files(&query).await?;
        Ok(self.stale.files(files).await)
    }
}
