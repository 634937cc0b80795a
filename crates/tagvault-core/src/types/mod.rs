//! Core type definitions used across the TagVault workspace.

pub mod id;

pub use id::*;
