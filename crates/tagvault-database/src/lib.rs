//! # tagvault-database
//!
//! The catalog store for TagVault: the [`CatalogStore`] contract, its
//! PostgreSQL implementation (connection pool, migrations, and one
//! repository per table family), and an in-memory implementation used
//! for single-process deployments and tests.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod repositories;
pub mod store;

use std::sync::Arc;

use tagvault_core::config::{DatabaseConfig, DatabaseProvider};
use tagvault_core::result::AppResult;

pub use connection::DatabasePool;
pub use memory::MemoryCatalogStore;
pub use postgres::PgCatalogStore;
pub use store::{CatalogStore, FileSearch};

/// Build the configured catalog store, running migrations for PostgreSQL.
pub async fn connect_store(config: &DatabaseConfig) -> AppResult<Arc<dyn CatalogStore>> {
    match config.provider {
        DatabaseProvider::Memory => {
            tracing::info!("Using in-memory catalog store");
            Ok(Arc::new(MemoryCatalogStore::new()))
        }
        DatabaseProvider::Postgres => {
            let pool = DatabasePool::connect(config).await?;
            migration::run_migrations(pool.pool()).await?;
            Ok(Arc::new(PgCatalogStore::new(pool.into_pool())))
        }
    }
}
