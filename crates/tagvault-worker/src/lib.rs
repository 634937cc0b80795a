//! Background job processing for TagVault.
//!
//! This crate provides:
//! - A single-flight FIFO job queue that drains itself on demand
//! - Cleanup job bodies for vanished records and deferred disk work
//! - A scheduler that places those jobs on the shared queue

pub mod jobs;
pub mod queue;

pub use jobs::CleanupJobs;
pub use queue::{JobQueue, JobResult, QueueStats};
