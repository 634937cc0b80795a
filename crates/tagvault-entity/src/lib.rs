//! # tagvault-entity
//!
//! Catalog entity models for TagVault. Every struct in this crate
//! represents a database table row or the data needed to insert one.
//! Row types derive `sqlx::FromRow` so the PostgreSQL store can map
//! query results directly.

pub mod file;
pub mod folder;
pub mod tag;

pub use file::{File, NewFile};
pub use folder::{Folder, NewFolder};
pub use tag::{NewTag, Tag};
