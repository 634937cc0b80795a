//! Tag domain entities.

pub mod model;

pub use model::{NewTag, Tag, slugify};
