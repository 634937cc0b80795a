//! # tagvault-storage
//!
//! Physical side of the catalog: the [`PathMapper`] between logical
//! folder paths and locations under the upload root, [`LocalDisk`]
//! filesystem operations, and the recursive tree walk used by
//! reconciliation.

pub mod local;
pub mod mime;
pub mod paths;
pub mod walk;

pub use local::LocalDisk;
pub use paths::PathMapper;
pub use walk::{EntryKind, WalkEntry, WalkOutcome};
