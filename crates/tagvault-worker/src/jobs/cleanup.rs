//! Cleanup job bodies: record removal for vanished entries and the
//! physical side effects of user mutations.

use std::path::Path;

use tracing::{debug, info};

use tagvault_core::result::AppResult;
use tagvault_core::types::{FileId, FolderId};
use tagvault_database::CatalogStore;
use tagvault_storage::LocalDisk;

/// Delete a file record whose physical file has vanished.
///
/// The record is re-read and its current storage path probed first; if
/// the file is back on disk the record is kept. A record that is already
/// gone is a no-op.
pub async fn remove_file_record(
    store: &dyn CatalogStore,
    disk: &LocalDisk,
    file_id: FileId,
) -> AppResult<()> {
    let Some(file) = store.find_file(file_id).await? else {
        debug!(file_id = %file_id, "File record already removed");
        return Ok(());
    };

    if disk.file_exists(Path::new(&file.storage_path)).await {
        info!(
            file_id = %file_id,
            storage_path = %file.storage_path,
            "File reappeared on disk, keeping record"
        );
        return Ok(());
    }

    if store.delete_file(file_id).await? {
        info!(
            file_id = %file_id,
            storage_path = %file.storage_path,
            "Removed record for vanished file"
        );
    }
    Ok(())
}

/// Delete a folder record (and its subtree) whose directory has vanished.
///
/// Same re-verification as [`remove_file_record`], against the folder's
/// current logical path.
pub async fn remove_folder_record(
    store: &dyn CatalogStore,
    disk: &LocalDisk,
    folder_id: FolderId,
) -> AppResult<()> {
    let Some(folder) = store.find_folder(folder_id).await? else {
        debug!(folder_id = %folder_id, "Folder record already removed");
        return Ok(());
    };

    if folder.is_root() {
        debug!(folder_id = %folder_id, "Refusing to remove the root folder record");
        return Ok(());
    }

    let physical = disk.mapper().to_physical(&folder.full_path);
    if disk.dir_exists(&physical).await {
        info!(
            folder_id = %folder_id,
            full_path = %folder.full_path,
            "Directory reappeared on disk, keeping record"
        );
        return Ok(());
    }

    if store.delete_folder(folder_id).await? {
        info!(
            folder_id = %folder_id,
            full_path = %folder.full_path,
            "Removed record for vanished folder"
        );
    }
    Ok(())
}

/// Unlink a physical file. A missing file is not an error.
pub async fn unlink_file(disk: &LocalDisk, path: &Path) -> AppResult<()> {
    disk.remove_file(path).await
}

/// Remove a physical directory tree. A missing directory is not an error.
pub async fn remove_dir(disk: &LocalDisk, path: &Path) -> AppResult<()> {
    disk.remove_dir_all(path).await
}

/// Rename a physical path.
pub async fn rename_path(disk: &LocalDisk, from: &Path, to: &Path) -> AppResult<()> {
    disk.rename(from, to).await
}

#[cfg(test)]
mod tests {
    use super::*;

    use tagvault_database::MemoryCatalogStore;
    use tagvault_entity::{NewFile, NewFolder};

    struct Fixture {
        _dir: tempfile::TempDir,
        store: MemoryCatalogStore,
        disk: LocalDisk,
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let disk = LocalDisk::new(dir.path().join("files")).await.unwrap();
        let store = MemoryCatalogStore::new();
        store
            .insert_folder(&NewFolder {
                name: "root".into(),
                parent_id: None,
                full_path: "/root".into(),
            })
            .await
            .unwrap();
        Fixture {
            _dir: dir,
            store,
            disk,
        }
    }

    async fn file_at(fx: &Fixture, name: &str) -> (FileId, std::path::PathBuf) {
        let root = fx.store.root_folder().await.unwrap().unwrap();
        let path = fx.disk.mapper().to_physical("/root").join(name);
        let file = fx
            .store
            .insert_file(&NewFile {
                folder_id: root.id,
                name: name.into(),
                storage_path: path.to_string_lossy().into_owned(),
                size_bytes: 1,
                mime_type: None,
            })
            .await
            .unwrap();
        (file.id, path)
    }

    #[tokio::test]
    async fn test_remove_file_record_is_idempotent() {
        let fx = fixture().await;
        let (file_id, _) = file_at(&fx, "gone.txt").await;

        remove_file_record(&fx.store, &fx.disk, file_id).await.unwrap();
        assert!(fx.store.find_file(file_id).await.unwrap().is_none());

        remove_file_record(&fx.store, &fx.disk, file_id).await.unwrap();
        assert!(fx.store.find_file(file_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remove_file_record_keeps_reappeared_file() {
        let fx = fixture().await;
        let (file_id, path) = file_at(&fx, "back.txt").await;
        fx.disk.create_dir_all(path.parent().unwrap()).await.unwrap();
        std::fs::write(&path, b"x").unwrap();

        remove_file_record(&fx.store, &fx.disk, file_id).await.unwrap();
        assert!(fx.store.find_file(file_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_remove_folder_record_cascades_without_touching_disk() {
        let fx = fixture().await;
        let root = fx.store.root_folder().await.unwrap().unwrap();
        let drafts = fx
            .store
            .insert_folder(&NewFolder::child_of(&root, "drafts"))
            .await
            .unwrap();
        let sibling = fx.disk.mapper().to_physical("/root/keep");
        fx.disk.create_dir_all(&sibling).await.unwrap();

        remove_folder_record(&fx.store, &fx.disk, drafts.id).await.unwrap();
        assert!(fx.store.find_folder(drafts.id).await.unwrap().is_none());
        assert!(fx.disk.dir_exists(&sibling).await);

        remove_folder_record(&fx.store, &fx.disk, drafts.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_folder_record_never_removes_root() {
        let fx = fixture().await;
        let root = fx.store.root_folder().await.unwrap().unwrap();
        remove_folder_record(&fx.store, &fx.disk, root.id).await.unwrap();
        assert!(fx.store.root_folder().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_physical_jobs_tolerate_missing_targets() {
        let fx = fixture().await;
        let missing = fx.disk.mapper().to_physical("/root/none");
        unlink_file(&fx.disk, &missing.join("x.txt")).await.unwrap();
        remove_dir(&fx.disk, &missing).await.unwrap();
        assert!(rename_path(&fx.disk, &missing, &fx.disk.mapper().to_physical("/root/n2"))
            .await
            .is_err());
    }
}
