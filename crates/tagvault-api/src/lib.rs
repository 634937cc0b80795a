//! # tagvault-api
//!
//! HTTP API layer for TagVault built on Axum.
//!
//! Provides the REST endpoints, the multipart upload ingestor,
//! middleware (CORS, compression, request logging), DTOs, and the
//! mapping from `AppError` to HTTP responses.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{bootstrap, build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
