//! Folder lookup-or-insert shared by reconciliation and uploads.

use tagvault_core::result::AppResult;
use tagvault_database::CatalogStore;
use tagvault_entity::{Folder, NewFolder};

/// Insert a folder, or return the existing record at the same path.
///
/// The boolean is `true` when this call created the record. A path
/// conflict means another writer got there first, which is success.
pub async fn find_or_insert_folder(
    store: &dyn CatalogStore,
    data: &NewFolder,
) -> AppResult<(Folder, bool)> {
    if let Some(existing) = store.find_folder_by_path(&data.full_path).await? {
        return Ok((existing, false));
    }

    match store.insert_folder(data).await {
        Ok(folder) => Ok((folder, true)),
        Err(e) if e.is_conflict() => {
            let existing = store.find_folder_by_path(&data.full_path).await?;
            existing.map(|f| (f, false)).ok_or(e)
        }
        Err(e) => Err(e),
    }
}
