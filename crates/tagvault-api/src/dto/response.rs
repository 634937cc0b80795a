//! Response DTOs.

use serde::{Deserialize, Serialize};

use tagvault_entity::{File, Tag};
use tagvault_worker::QueueStats;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message.
    pub message: String,
}

impl MessageResponse {
    /// Creates a message response.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A file with the tags attached to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDetails {
    /// File metadata.
    #[serde(flatten)]
    pub file: File,
    /// Tags attached directly to the file.
    pub tags: Vec<Tag>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
    /// Uptime.
    pub uptime_seconds: u64,
    /// Background queue counters.
    pub queue: QueueStats,
}
