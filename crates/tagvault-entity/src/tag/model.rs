//! Tag entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use tagvault_core::types::TagId;

/// A tag that can be attached to folders and files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    /// Unique tag identifier.
    pub id: TagId,
    /// Display name.
    pub name: String,
    /// URL-safe unique identifier derived from the name.
    pub slug: String,
    /// Display color as `#rrggbb`.
    pub color_hex: String,
    /// When the tag was created.
    pub created_at: DateTime<Utc>,
}

/// Data required to insert a new tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTag {
    /// Display name.
    pub name: String,
    /// Unique slug.
    pub slug: String,
    /// Display color.
    pub color_hex: String,
}

/// Derive a slug: lowercase ASCII alphanumeric runs joined by `-`.
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
