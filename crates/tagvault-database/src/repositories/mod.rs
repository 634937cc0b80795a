//! PostgreSQL repositories, one per table family.

pub mod file;
pub mod folder;
pub mod tag;

pub use file::FileRepository;
pub use folder::FolderRepository;
pub use tag::TagRepository;

use sqlx::Error as SqlxError;

use tagvault_core::error::{AppError, ErrorKind};

/// Map an insert/update failure, turning constraint violations into
/// domain errors.
pub(crate) fn map_write_error(err: SqlxError, what: &str, conflict_message: String) -> AppError {
    match &err {
        SqlxError::Database(db_err) if db_err.is_unique_violation() => {
            AppError::conflict(conflict_message)
        }
        SqlxError::Database(db_err) if db_err.is_foreign_key_violation() => {
            AppError::not_found(format!("Referenced record for {what} no longer exists"))
        }
        _ => AppError::with_source(ErrorKind::Database, format!("Failed to write {what}"), err),
    }
}
