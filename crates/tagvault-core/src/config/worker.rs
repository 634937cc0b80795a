//! Background job queue configuration.

use serde::{Deserialize, Serialize};

/// Background job queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Enqueue a reconciliation pass over the root folder at startup.
    #[serde(default = "default_true")]
    pub sync_on_startup: bool,
    /// Jobs running longer than this many milliseconds are logged at warn.
    #[serde(default = "default_slow_job_warn_ms")]
    pub slow_job_warn_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            sync_on_startup: default_true(),
            slow_job_warn_ms: default_slow_job_warn_ms(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_slow_job_warn_ms() -> u64 {
    5_000
}
