//! Tag CRUD and folder/file associations.

use std::sync::Arc;

use tracing::info;

use tagvault_core::error::AppError;
use tagvault_core::result::AppResult;
use tagvault_core::types::{FileId, FolderId, TagId};
use tagvault_database::CatalogStore;
use tagvault_entity::tag::slugify;
use tagvault_entity::{NewTag, Tag};

/// Colors handed out to tags created without one.
const PALETTE: [&str; 8] = [
    "#e57373", "#f06292", "#ba68c8", "#7986cb", "#4fc3f7", "#4db6ac", "#aed581", "#ffb74d",
];

/// Manages tags and their attachments.
#[derive(Debug, Clone)]
pub struct TagService {
    /// Catalog store.
    store: Arc<dyn CatalogStore>,
}

impl TagService {
    /// Creates a new tag service.
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// All tags ordered by name.
    pub async fn list(&self) -> AppResult<Vec<Tag>> {
        self.store.list_tags().await
    }

    /// Creates a tag. Without a color, one is picked from the slug.
    pub async fn create(&self, name: &str, color: Option<&str>) -> AppResult<Tag> {
        let name = name.trim();
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(AppError::validation(
                "Tag name must contain at least one letter or digit",
            ));
        }

        let color_hex = match color {
            Some(color) => normalize_color(color)?,
            None => palette_color(&slug).to_string(),
        };

        let tag = self
            .store
            .insert_tag(&NewTag {
                name: name.to_string(),
                slug,
                color_hex,
            })
            .await?;

        info!(tag_id = %tag.id, slug = %tag.slug, "Created tag");
        Ok(tag)
    }

    /// Deletes a tag and every association to it.
    pub async fn delete(&self, id: TagId) -> AppResult<()> {
        if !self.store.delete_tag(id).await? {
            return Err(AppError::not_found(format!("Tag {id} not found")));
        }
        info!(tag_id = %id, "Deleted tag");
        Ok(())
    }

    /// Attach a tag to a folder. Attaching twice is a no-op.
    pub async fn attach_to_folder(&self, folder_id: FolderId, tag_id: TagId) -> AppResult<()> {
        self.require_folder(folder_id).await?;
        self.require_tag(tag_id).await?;
        self.store.tag_folder(folder_id, tag_id).await
    }

    /// Detach a tag from a folder. Detaching an absent link is a no-op.
    pub async fn detach_from_folder(&self, folder_id: FolderId, tag_id: TagId) -> AppResult<()> {
        self.store.untag_folder(folder_id, tag_id).await?;
        Ok(())
    }

    /// Attach a tag to a file. Attaching twice is a no-op.
    pub async fn attach_to_file(&self, file_id: FileId, tag_id: TagId) -> AppResult<()> {
        self.require_file(file_id).await?;
        self.require_tag(tag_id).await?;
        self.store.tag_file(file_id, tag_id).await
    }

    /// Detach a tag from a file. Detaching an absent link is a no-op.
    pub async fn detach_from_file(&self, file_id: FileId, tag_id: TagId) -> AppResult<()> {
        self.store.untag_file(file_id, tag_id).await?;
        Ok(())
    }

    /// Tags attached directly to a folder.
    pub async fn tags_for_folder(&self, folder_id: FolderId) -> AppResult<Vec<Tag>> {
        self.require_folder(folder_id).await?;
        self.store.tags_for_folder(folder_id).await
    }

    /// Tags attached directly to a file.
    pub async fn tags_for_file(&self, file_id: FileId) -> AppResult<Vec<Tag>> {
        self.require_file(file_id).await?;
        self.store.tags_for_file(file_id).await
    }

    async fn require_folder(&self, id: FolderId) -> AppResult<()> {
        match self.store.find_folder(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found(format!("Folder {id} not found"))),
        }
    }

    async fn require_file(&self, id: FileId) -> AppResult<()> {
        match self.store.find_file(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found(format!("File {id} not found"))),
        }
    }

    async fn require_tag(&self, id: TagId) -> AppResult<()> {
        match self.store.find_tag(id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found(format!("Tag {id} not found"))),
        }
    }
}

/// Accept `#rrggbb` (or `rrggbb`), returned lowercase with the `#`.
fn normalize_color(color: &str) -> AppResult<String> {
    let hex = color.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AppError::validation(format!(
            "'{color}' is not a #rrggbb color"
        )));
    }
    Ok(format!("#{}", hex.to_ascii_lowercase()))
}

fn palette_color(slug: &str) -> &'static str {
    let hash = slug
        .bytes()
        .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(usize::from(b)));
    PALETTE[hash % PALETTE.len()]
}
