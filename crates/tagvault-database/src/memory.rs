//! In-memory catalog store.
//!
//! Holds the whole catalog behind one async `RwLock`. Integer identities
//! are assigned from per-table counters, so ids are never reused within
//! a process.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use tagvault_core::error::AppError;
use tagvault_core::result::AppResult;
use tagvault_core::types::{FileId, FolderId, TagId};
use tagvault_entity::folder::path;
use tagvault_entity::{File, Folder, NewFile, NewFolder, NewTag, Tag};

use crate::store::{CatalogStore, FileSearch};

#[derive(Debug, Default)]
struct State {
    next_folder_id: i64,
    next_file_id: i64,
    next_tag_id: i64,
    folders: BTreeMap<FolderId, Folder>,
    files: BTreeMap<FileId, File>,
    tags: BTreeMap<TagId, Tag>,
    folder_tags: BTreeSet<(FolderId, TagId)>,
    file_tags: BTreeSet<(FileId, TagId)>,
}

impl State {
    fn has_children(&self, id: FolderId) -> bool {
        self.folders.values().any(|f| f.parent_id == Some(id))
    }

    /// Clone a folder row with `has_children` filled in.
    fn view(&self, folder: &Folder) -> Folder {
        Folder {
            has_children: self.has_children(folder.id),
            ..folder.clone()
        }
    }

    fn folder_by_path(&self, full_path: &str) -> Option<&Folder> {
        self.folders.values().find(|f| f.full_path == full_path)
    }

    /// Ids of `root` and every folder beneath it, breadth first.
    fn subtree_ids(&self, root: FolderId) -> Vec<FolderId> {
        let mut ids = Vec::new();
        let mut queue = VecDeque::from([root]);
        while let Some(id) = queue.pop_front() {
            ids.push(id);
            queue.extend(
                self.folders
                    .values()
                    .filter(|f| f.parent_id == Some(id))
                    .map(|f| f.id),
            );
        }
        ids
    }

    fn remove_file(&mut self, id: FileId) -> bool {
        self.file_tags.retain(|(file_id, _)| *file_id != id);
        self.files.remove(&id).is_some()
    }

    fn sorted_tags(&self, ids: impl Iterator<Item = TagId>) -> Vec<Tag> {
        let mut tags: Vec<Tag> = ids.filter_map(|id| self.tags.get(&id).cloned()).collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        tags
    }
}

/// Catalog store that keeps every record in process memory.
#[derive(Debug, Default)]
pub struct MemoryCatalogStore {
    state: RwLock<State>,
}

impl MemoryCatalogStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn root_folder(&self) -> AppResult<Option<Folder>> {
        let state = self.state.read().await;
        Ok(state
            .folders
            .values()
            .find(|f| f.parent_id.is_none())
            .map(|f| state.view(f)))
    }

    async fn find_folder(&self, id: FolderId) -> AppResult<Option<Folder>> {
        let state = self.state.read().await;
        Ok(state.folders.get(&id).map(|f| state.view(f)))
    }

    async fn find_folder_by_path(&self, full_path: &str) -> AppResult<Option<Folder>> {
        let state = self.state.read().await;
        Ok(state.folder_by_path(full_path).map(|f| state.view(f)))
    }

    async fn list_child_folders(&self, parent_id: FolderId) -> AppResult<Vec<Folder>> {
        let state = self.state.read().await;
        let mut children: Vec<Folder> = state
            .folders
            .values()
            .filter(|f| f.parent_id == Some(parent_id))
            .map(|f| state.view(f))
            .collect();
        children.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(children)
    }

    async fn list_subtree_folders(&self, full_path: &str) -> AppResult<Vec<Folder>> {
        let state = self.state.read().await;
        let mut folders: Vec<Folder> = state
            .folders
            .values()
            .filter(|f| path::is_within(&f.full_path, full_path))
            .map(|f| state.view(f))
            .collect();
        folders.sort_by(|a, b| {
            a.full_path
                .len()
                .cmp(&b.full_path.len())
                .then_with(|| a.full_path.cmp(&b.full_path))
        });
        Ok(folders)
    }

    async fn list_ancestors(&self, id: FolderId) -> AppResult<Vec<Folder>> {
        let state = self.state.read().await;
        let mut chain = Vec::new();
        let mut cursor = state.folders.get(&id);
        while let Some(folder) = cursor {
            chain.push(state.view(folder));
            cursor = folder.parent_id.and_then(|p| state.folders.get(&p));
        }
        chain.reverse();
        Ok(chain)
    }

    async fn insert_folder(&self, data: &NewFolder) -> AppResult<Folder> {
        let mut state = self.state.write().await;
        if state.folder_by_path(&data.full_path).is_some() {
            return Err(AppError::conflict(format!(
                "Folder path '{}' already exists",
                data.full_path
            )));
        }
        if let Some(parent_id) = data.parent_id {
            if !state.folders.contains_key(&parent_id) {
                return Err(AppError::not_found(format!(
                    "Parent folder {parent_id} no longer exists"
                )));
            }
        }

        state.next_folder_id += 1;
        let now = Utc::now();
        let folder = Folder {
            id: FolderId(state.next_folder_id),
            name: data.name.clone(),
            parent_id: data.parent_id,
            full_path: data.full_path.clone(),
            has_children: false,
            created_at: now,
            updated_at: now,
        };
        state.folders.insert(folder.id, folder.clone());
        Ok(folder)
    }

    async fn rename_folder(
        &self,
        id: FolderId,
        name: &str,
        new_full_path: &str,
    ) -> AppResult<Option<Folder>> {
        let mut state = self.state.write().await;
        let Some(old_path) = state.folders.get(&id).map(|f| f.full_path.clone()) else {
            return Ok(None);
        };

        let moving: Vec<(FolderId, String)> = state
            .folders
            .values()
            .filter_map(|f| {
                path::rebase(&f.full_path, &old_path, new_full_path).map(|p| (f.id, p))
            })
            .collect();
        let moving_ids: BTreeSet<FolderId> = moving.iter().map(|(id, _)| *id).collect();
        for (_, new_path) in &moving {
            let clash = state
                .folders
                .values()
                .any(|f| !moving_ids.contains(&f.id) && f.full_path == *new_path);
            if clash {
                return Err(AppError::conflict(format!(
                    "Folder path '{new_path}' already exists"
                )));
            }
        }

        let now = Utc::now();
        for (folder_id, new_path) in moving {
            if let Some(folder) = state.folders.get_mut(&folder_id) {
                folder.full_path = new_path;
                folder.updated_at = now;
            }
        }
        if let Some(folder) = state.folders.get_mut(&id) {
            folder.name = name.to_string();
        }
        Ok(state.folders.get(&id).map(|f| state.view(f)))
    }

    async fn delete_folder(&self, id: FolderId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if !state.folders.contains_key(&id) {
            return Ok(false);
        }

        let doomed: BTreeSet<FolderId> = state.subtree_ids(id).into_iter().collect();
        let doomed_files: Vec<FileId> = state
            .files
            .values()
            .filter(|f| doomed.contains(&f.folder_id))
            .map(|f| f.id)
            .collect();
        for file_id in doomed_files {
            state.remove_file(file_id);
        }
        state.folder_tags.retain(|(folder_id, _)| !doomed.contains(folder_id));
        state.folders.retain(|folder_id, _| !doomed.contains(folder_id));
        Ok(true)
    }

    async fn find_file(&self, id: FileId) -> AppResult<Option<File>> {
        Ok(self.state.read().await.files.get(&id).cloned())
    }

    async fn list_files_in_folder(&self, folder_id: FolderId) -> AppResult<Vec<File>> {
        let state = self.state.read().await;
        let mut files: Vec<File> = state
            .files
            .values()
            .filter(|f| f.folder_id == folder_id)
            .cloned()
            .collect();
        files.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(files)
    }

    async fn list_files_in_folders(&self, folder_ids: &[FolderId]) -> AppResult<Vec<File>> {
        let wanted: BTreeSet<FolderId> = folder_ids.iter().copied().collect();
        let state = self.state.read().await;
        let mut files: Vec<File> = state
            .files
            .values()
            .filter(|f| wanted.contains(&f.folder_id))
            .cloned()
            .collect();
        files.sort_by(|a, b| a.storage_path.cmp(&b.storage_path));
        Ok(files)
    }

    async fn insert_file(&self, data: &NewFile) -> AppResult<File> {
        let mut state = self.state.write().await;
        if !state.folders.contains_key(&data.folder_id) {
            return Err(AppError::not_found(format!(
                "Folder {} no longer exists",
                data.folder_id
            )));
        }
        if state
            .files
            .values()
            .any(|f| f.storage_path == data.storage_path)
        {
            return Err(AppError::conflict(format!(
                "A file is already stored at '{}'",
                data.storage_path
            )));
        }

        state.next_file_id += 1;
        let now = Utc::now();
        let file = File {
            id: FileId(state.next_file_id),
            folder_id: data.folder_id,
            name: data.name.clone(),
            storage_path: data.storage_path.clone(),
            size_bytes: data.size_bytes,
            mime_type: data.mime_type.clone(),
            created_at: now,
            updated_at: now,
        };
        state.files.insert(file.id, file.clone());
        Ok(file)
    }

    async fn rename_file(&self, id: FileId, name: &str) -> AppResult<Option<File>> {
        let mut state = self.state.write().await;
        Ok(state.files.get_mut(&id).map(|file| {
            file.name = name.to_string();
            file.updated_at = Utc::now();
            file.clone()
        }))
    }

    async fn rewrite_storage_prefix(&self, old_prefix: &str, new_prefix: &str) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let mut updated = 0;
        for file in state.files.values_mut() {
            if file.storage_path == old_prefix.trim_end_matches('/') {
                continue;
            }
            if let Some(rebased) = path::rebase(&file.storage_path, old_prefix, new_prefix) {
                file.storage_path = rebased;
                file.updated_at = now;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete_file(&self, id: FileId) -> AppResult<bool> {
        Ok(self.state.write().await.remove_file(id))
    }

    async fn search_files(&self, query: &FileSearch) -> AppResult<Vec<File>> {
        let state = self.state.read().await;
        let needle = query.text.as_deref().map(str::to_lowercase);

        let tag_scope = match query.tag_slug.as_deref() {
            Some(slug) => {
                let Some(tag) = state.tags.values().find(|t| t.slug == slug) else {
                    return Ok(Vec::new());
                };
                let tagged_paths: Vec<&str> = state
                    .folder_tags
                    .iter()
                    .filter(|(_, tag_id)| *tag_id == tag.id)
                    .filter_map(|(folder_id, _)| state.folders.get(folder_id))
                    .map(|f| f.full_path.as_str())
                    .collect();
                Some((tag.id, tagged_paths))
            }
            None => None,
        };

        let mut files: Vec<File> = state
            .files
            .values()
            .filter(|f| {
                needle
                    .as_deref()
                    .is_none_or(|n| f.name.to_lowercase().contains(n))
            })
            .filter(|f| match &tag_scope {
                None => true,
                Some((tag_id, tagged_paths)) => {
                    state.file_tags.contains(&(f.id, *tag_id))
                        || state.folders.get(&f.folder_id).is_some_and(|folder| {
                            tagged_paths
                                .iter()
                                .any(|p| path::is_within(&folder.full_path, p))
                        })
                }
            })
            .cloned()
            .collect();
        files.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        files.truncate(usize::try_from(query.limit).unwrap_or(0));
        Ok(files)
    }

    async fn list_tags(&self) -> AppResult<Vec<Tag>> {
        let state = self.state.read().await;
        Ok(state.sorted_tags(state.tags.keys().copied()))
    }

    async fn find_tag(&self, id: TagId) -> AppResult<Option<Tag>> {
        Ok(self.state.read().await.tags.get(&id).cloned())
    }

    async fn find_tag_by_slug(&self, slug: &str) -> AppResult<Option<Tag>> {
        let state = self.state.read().await;
        Ok(state.tags.values().find(|t| t.slug == slug).cloned())
    }

    async fn insert_tag(&self, data: &NewTag) -> AppResult<Tag> {
        let mut state = self.state.write().await;
        if state.tags.values().any(|t| t.slug == data.slug) {
            return Err(AppError::conflict(format!(
                "Tag '{}' already exists",
                data.slug
            )));
        }
        state.next_tag_id += 1;
        let tag = Tag {
            id: TagId(state.next_tag_id),
            name: data.name.clone(),
            slug: data.slug.clone(),
            color_hex: data.color_hex.clone(),
            created_at: Utc::now(),
        };
        state.tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn delete_tag(&self, id: TagId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        state.folder_tags.retain(|(_, tag_id)| *tag_id != id);
        state.file_tags.retain(|(_, tag_id)| *tag_id != id);
        Ok(state.tags.remove(&id).is_some())
    }

    async fn tag_folder(&self, folder_id: FolderId, tag_id: TagId) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.folders.contains_key(&folder_id) || !state.tags.contains_key(&tag_id) {
            return Err(AppError::not_found(
                "Referenced record for folder tag no longer exists",
            ));
        }
        state.folder_tags.insert((folder_id, tag_id));
        Ok(())
    }

    async fn untag_folder(&self, folder_id: FolderId, tag_id: TagId) -> AppResult<bool> {
        Ok(self
            .state
            .write()
            .await
            .folder_tags
            .remove(&(folder_id, tag_id)))
    }

    async fn tag_file(&self, file_id: FileId, tag_id: TagId) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.files.contains_key(&file_id) || !state.tags.contains_key(&tag_id) {
            return Err(AppError::not_found(
                "Referenced record for file tag no longer exists",
            ));
        }
        state.file_tags.insert((file_id, tag_id));
        Ok(())
    }

    async fn untag_file(&self, file_id: FileId, tag_id: TagId) -> AppResult<bool> {
        Ok(self.state.write().await.file_tags.remove(&(file_id, tag_id)))
    }

    async fn tags_for_folder(&self, folder_id: FolderId) -> AppResult<Vec<Tag>> {
        let state = self.state.read().await;
        Ok(state.sorted_tags(
            state
                .folder_tags
                .iter()
                .filter(|(id, _)| *id == folder_id)
                .map(|(_, tag_id)| *tag_id),
        ))
    }

    async fn tags_for_file(&self, file_id: FileId) -> AppResult<Vec<Tag>> {
        let state = self.state.read().await;
        Ok(state.sorted_tags(
            state
                .file_tags
                .iter()
                .filter(|(id, _)| *id == file_id)
                .map(|(_, tag_id)| *tag_id),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn folder(store: &MemoryCatalogStore, parent: Option<&Folder>, name: &str) -> Folder {
        let data = match parent {
            Some(parent) => NewFolder::child_of(parent, name),
            None => NewFolder {
                name: name.to_string(),
                parent_id: None,
                full_path: format!("/{name}"),
            },
        };
        store.insert_folder(&data).await.expect("insert folder")
    }

    async fn file(store: &MemoryCatalogStore, folder: &Folder, name: &str) -> File {
        store
            .insert_file(&NewFile {
                folder_id: folder.id,
                name: name.to_string(),
                storage_path: format!("/data{}/{name}", folder.full_path),
                size_bytes: 3,
                mime_type: None,
            })
            .await
            .expect("insert file")
    }

    #[tokio::test]
    async fn test_duplicate_path_is_conflict() {
        let store = MemoryCatalogStore::new();
        let root = folder(&store, None, "root").await;
        folder(&store, Some(&root), "a").await;
        let err = store
            .insert_folder(&NewFolder::child_of(&root, "a"))
            .await
            .expect_err("duplicate");
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_subtree_respects_segment_boundary() {
        let store = MemoryCatalogStore::new();
        let root = folder(&store, None, "root").await;
        let a = folder(&store, Some(&root), "a").await;
        folder(&store, Some(&a), "b").await;
        folder(&store, Some(&root), "ab").await;

        let paths: Vec<String> = store
            .list_subtree_folders("/root/a")
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.full_path)
            .collect();
        assert_eq!(paths, vec!["/root/a", "/root/a/b"]);
    }

    #[tokio::test]
    async fn test_has_children_is_derived() {
        let store = MemoryCatalogStore::new();
        let root = folder(&store, None, "root").await;
        let a = folder(&store, Some(&root), "a").await;
        assert!(!store.find_folder(a.id).await.unwrap().unwrap().has_children);
        folder(&store, Some(&a), "b").await;
        assert!(store.find_folder(a.id).await.unwrap().unwrap().has_children);
    }

    #[tokio::test]
    async fn test_rename_rewrites_descendant_paths() {
        let store = MemoryCatalogStore::new();
        let root = folder(&store, None, "root").await;
        let a = folder(&store, Some(&root), "A").await;
        let b = folder(&store, Some(&a), "B").await;

        let renamed = store
            .rename_folder(a.id, "A2", "/root/A2")
            .await
            .unwrap()
            .expect("folder exists");
        assert_eq!(renamed.name, "A2");
        assert_eq!(renamed.full_path, "/root/A2");
        let b = store.find_folder(b.id).await.unwrap().unwrap();
        assert_eq!(b.full_path, "/root/A2/B");
        assert_eq!(b.name, "B");
    }

    #[tokio::test]
    async fn test_delete_cascades_and_is_idempotent() {
        let store = MemoryCatalogStore::new();
        let root = folder(&store, None, "root").await;
        let a = folder(&store, Some(&root), "a").await;
        let b = folder(&store, Some(&a), "b").await;
        let inner = file(&store, &b, "x.txt").await;
        let outer = file(&store, &root, "y.txt").await;
        let tag = store
            .insert_tag(&NewTag {
                name: "Work".into(),
                slug: "work".into(),
                color_hex: "#3b82f6".into(),
            })
            .await
            .unwrap();
        store.tag_file(inner.id, tag.id).await.unwrap();
        store.tag_folder(b.id, tag.id).await.unwrap();

        assert!(store.delete_folder(a.id).await.unwrap());
        assert!(store.find_folder(b.id).await.unwrap().is_none());
        assert!(store.find_file(inner.id).await.unwrap().is_none());
        assert!(store.find_file(outer.id).await.unwrap().is_some());
        assert!(store.tags_for_file(inner.id).await.unwrap().is_empty());
        assert!(store.tags_for_folder(b.id).await.unwrap().is_empty());

        assert!(!store.delete_folder(a.id).await.unwrap());
        assert!(!store.delete_file(inner.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_search_matches_ancestor_folder_tag() {
        let store = MemoryCatalogStore::new();
        let root = folder(&store, None, "root").await;
        let photos = folder(&store, Some(&root), "photos").await;
        let trip = folder(&store, Some(&photos), "trip").await;
        let beach = file(&store, &trip, "Beach.jpg").await;
        file(&store, &root, "notes.txt").await;
        let tag = store
            .insert_tag(&NewTag {
                name: "Holiday".into(),
                slug: "holiday".into(),
                color_hex: "#ef4444".into(),
            })
            .await
            .unwrap();
        store.tag_folder(photos.id, tag.id).await.unwrap();

        let by_tag = store
            .search_files(&FileSearch {
                text: None,
                tag_slug: Some("holiday".into()),
                limit: 50,
            })
            .await
            .unwrap();
        assert_eq!(by_tag.len(), 1);
        assert_eq!(by_tag[0].id, beach.id);

        let by_text = store
            .search_files(&FileSearch {
                text: Some("beach".into()),
                tag_slug: None,
                limit: 50,
            })
            .await
            .unwrap();
        assert_eq!(by_text.len(), 1);

        let unknown = store
            .search_files(&FileSearch {
                text: None,
                tag_slug: Some("nope".into()),
                limit: 50,
            })
            .await
            .unwrap();
        assert!(unknown.is_empty());
    }

    #[tokio::test]
    async fn test_rewrite_storage_prefix() {
        let store = MemoryCatalogStore::new();
        let root = folder(&store, None, "root").await;
        let a = folder(&store, Some(&root), "A").await;
        let moved = file(&store, &a, "x.txt").await;
        let sibling = store
            .insert_file(&NewFile {
                folder_id: root.id,
                name: "y.txt".into(),
                storage_path: "/data/root/AB/y.txt".into(),
                size_bytes: 1,
                mime_type: None,
            })
            .await
            .unwrap();

        let updated = store
            .rewrite_storage_prefix("/data/root/A", "/data/root/A2")
            .await
            .unwrap();
        assert_eq!(updated, 1);
        let moved = store.find_file(moved.id).await.unwrap().unwrap();
        assert_eq!(moved.storage_path, "/data/root/A2/x.txt");
        let sibling = store.find_file(sibling.id).await.unwrap().unwrap();
        assert_eq!(sibling.storage_path, "/data/root/AB/y.txt");
    }
}
