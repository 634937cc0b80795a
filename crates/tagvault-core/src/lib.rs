//! # tagvault-core
//!
//! Core crate for TagVault. Contains configuration schemas, typed
//! integer identifiers, and the unified error system.
//!
//! This crate has **no** internal dependencies on other TagVault crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
