//! Recursive disk-to-catalog reconciliation.
//!
//! A pass walks the physical subtree of one folder and compares it with
//! the catalog's view of the same subtree. Untracked directories and
//! files are inserted right away, shallowest first. Records whose
//! physical counterpart is gone are handed to cleanup jobs. The disk is
//! never modified.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use tagvault_core::result::AppResult;
use tagvault_core::types::FolderId;
use tagvault_database::CatalogStore;
use tagvault_entity::folder::path;
use tagvault_entity::{Folder, NewFile, NewFolder};
use tagvault_storage::LocalDisk;
use tagvault_storage::mime::mime_from_name;
use tagvault_worker::{CleanupJobs, JobResult};

use super::chain::find_or_insert_folder;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// The folder the pass started from.
    pub folder_id: Option<FolderId>,
    /// Whether the pass was skipped (missing folder record or directory).
    pub skipped: bool,
    /// Folder records inserted for untracked directories.
    pub folders_added: usize,
    /// File records inserted for untracked files.
    pub files_added: usize,
    /// Folder removals handed to the job queue.
    pub folders_scheduled_for_removal: usize,
    /// File removals handed to the job queue.
    pub files_scheduled_for_removal: usize,
    /// Branches the walk could not read; left untouched.
    pub unreadable_branches: usize,
}

/// Reconciles catalog subtrees with the physical tree.
#[derive(Debug, Clone)]
pub struct Reconciler {
    store: Arc<dyn CatalogStore>,
    disk: LocalDisk,
    cleanup: CleanupJobs,
}

impl Reconciler {
    /// Creates a new reconciler.
    pub fn new(store: Arc<dyn CatalogStore>, disk: LocalDisk, cleanup: CleanupJobs) -> Self {
        Self {
            store,
            disk,
            cleanup,
        }
    }

    /// Queue a pass over `folder` without waiting for it.
    pub fn schedule(&self, folder: &Folder) {
        let reconciler = self.clone();
        let (folder_id, full_path) = (folder.id, folder.full_path.clone());
        self.cleanup.queue().enqueue("reconcile", async move {
            reconciler.reconcile(folder_id, &full_path).await.map(|_| ())
        });
    }

    /// Queue a pass over `folder` and hand back its report.
    pub fn schedule_with_report(&self, folder: &Folder) -> JobResult<SyncReport> {
        let reconciler = self.clone();
        let (folder_id, full_path) = (folder.id, folder.full_path.clone());
        self.cleanup
            .queue()
            .enqueue_with_result("reconcile", async move {
                reconciler.reconcile(folder_id, &full_path).await
            })
    }

    /// Run one pass over the subtree of `folder_id`.
    ///
    /// `full_path` is the path the caller saw; if the folder has been
    /// renamed since, its current path is used instead.
    pub async fn reconcile(&self, folder_id: FolderId, full_path: &str) -> AppResult<SyncReport> {
        let mut report = SyncReport {
            folder_id: Some(folder_id),
            ..SyncReport::default()
        };

        let Some(base) = self.store.find_folder(folder_id).await? else {
            debug!(
                folder_id = %folder_id,
                full_path,
                "Folder no longer exists, nothing to reconcile"
            );
            report.skipped = true;
            return Ok(report);
        };
        if base.full_path != full_path {
            debug!(
                folder_id = %folder_id,
                scheduled_path = full_path,
                current_path = %base.full_path,
                "Folder moved since the pass was scheduled"
            );
        }

        let mapper = self.disk.mapper();
        let physical_root = mapper.to_physical(&base.full_path);
        if !self.disk.dir_exists(&physical_root).await {
            debug!(
                folder_id = %folder_id,
                path = %physical_root.display(),
                "Directory missing, skipping pass"
            );
            report.skipped = true;
            return Ok(report);
        }

        // Known set.
        let known_folders = self.store.list_subtree_folders(&base.full_path).await?;
        let mut folder_ids: HashMap<String, FolderId> = known_folders
            .iter()
            .map(|f| (f.full_path.clone(), f.id))
            .collect();
        let known_folder_ids: Vec<FolderId> = known_folders.iter().map(|f| f.id).collect();
        let known_files = self.store.list_files_in_folders(&known_folder_ids).await?;
        let known_storage_paths: HashSet<&str> =
            known_files.iter().map(|f| f.storage_path.as_str()).collect();

        let walk = self.disk.walk_tree(&physical_root).await?;
        report.unreadable_branches = walk.unreadable.len();

        // Insert missing folders, parents before children.
        let mut seen_dirs: HashSet<String> = HashSet::new();
        let mut new_dirs: Vec<String> = Vec::new();
        for entry in walk.directories() {
            let Some(logical) = mapper.to_logical(&entry.path) else {
                warn!(path = %entry.path.display(), "Directory name is not valid UTF-8, skipping");
                continue;
            };
            if !folder_ids.contains_key(&logical) {
                new_dirs.push(logical.clone());
            }
            seen_dirs.insert(logical);
        }
        new_dirs.sort_by_key(|p| path::depth(p));

        for logical in &new_dirs {
            let Some(parent_id) = path::parent(logical).and_then(|p| folder_ids.get(p)).copied()
            else {
                warn!(full_path = %logical, "Parent folder unresolved, skipping directory");
                continue;
            };
            let data = NewFolder {
                name: path::name(logical).to_string(),
                parent_id: Some(parent_id),
                full_path: logical.clone(),
            };
            match find_or_insert_folder(self.store.as_ref(), &data).await {
                Ok((folder, created)) => {
                    if created {
                        debug!(
                            folder_id = %folder.id,
                            full_path = %folder.full_path,
                            "Discovered folder"
                        );
                        report.folders_added += 1;
                    }
                    folder_ids.insert(folder.full_path, folder.id);
                }
                Err(e) => {
                    warn!(
                        full_path = %logical,
                        error = %e,
                        "Failed to record discovered folder"
                    );
                }
            }
        }

        // Insert missing files.
        let mut seen_files: HashSet<String> = HashSet::new();
        for entry in walk.files() {
            let Some(storage_path) = entry.path.to_str().map(str::to_string) else {
                warn!(path = %entry.path.display(), "File name is not valid UTF-8, skipping");
                continue;
            };
            if known_storage_paths.contains(storage_path.as_str()) {
                seen_files.insert(storage_path);
                continue;
            }
            seen_files.insert(storage_path.clone());

            let Some(folder_id) = entry
                .path
                .parent()
                .and_then(|dir| mapper.to_logical(dir))
                .and_then(|logical| folder_ids.get(&logical).copied())
            else {
                warn!(path = %storage_path, "Containing folder unresolved, skipping file");
                continue;
            };
            let Some(name) = entry.path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let name = name.to_string();
            let data = NewFile {
                folder_id,
                mime_type: mime_from_name(&name),
                name,
                storage_path,
                size_bytes: i64::try_from(entry.size).unwrap_or(i64::MAX),
            };
            match self.store.insert_file(&data).await {
                Ok(file) => {
                    debug!(file_id = %file.id, path = %file.storage_path, "Discovered file");
                    report.files_added += 1;
                }
                Err(e) if e.is_conflict() => {
                    debug!(path = %data.storage_path, "File recorded concurrently");
                }
                Err(e) => {
                    warn!(
                        path = %data.storage_path,
                        error = %e,
                        "Failed to record discovered file"
                    );
                }
            }
        }

        // Vanished folders. Removal cascades, so descendants of a vanished
        // folder are covered by its own job.
        let vanished_folders: Vec<&Folder> = known_folders
            .iter()
            .filter(|f| f.id != base.id && !f.is_root())
            .filter(|f| !seen_dirs.contains(&f.full_path))
            .filter(|f| !walk.is_beneath_unreadable(&mapper.to_physical(&f.full_path)))
            .collect();
        let vanished_ids: HashSet<FolderId> = vanished_folders.iter().map(|f| f.id).collect();

        for file in &known_files {
            let storage_path = Path::new(&file.storage_path);
            if seen_files.contains(&file.storage_path)
                || vanished_ids.contains(&file.folder_id)
                || !storage_path.starts_with(&physical_root)
                || walk.is_beneath_unreadable(storage_path)
            {
                continue;
            }
            self.cleanup.remove_file_record(file.id);
            report.files_scheduled_for_removal += 1;
        }

        for folder in &vanished_folders {
            if folder.parent_id.is_some_and(|p| vanished_ids.contains(&p)) {
                continue;
            }
            self.cleanup.remove_folder_record(folder.id);
            report.folders_scheduled_for_removal += 1;
        }

        info!(
            folder_id = %folder_id,
            full_path = %base.full_path,
            folders_added = report.folders_added,
            files_added = report.files_added,
            folders_removed = report.folders_scheduled_for_removal,
            files_removed = report.files_scheduled_for_removal,
            unreadable = report.unreadable_branches,
            "Reconciliation pass complete"
        );

        Ok(report)
    }
}
