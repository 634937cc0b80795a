//! Keeping the catalog in step with the physical tree.

pub mod chain;
pub mod reconciler;
pub mod stale;

pub use chain::find_or_insert_folder;
pub use reconciler::{Reconciler, SyncReport};
pub use stale::StaleFilter;
