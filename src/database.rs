use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{Config, StorageBackend};
use crate::model::master_class::{MasterClass, NewMasterClass};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Could not connect to the database: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("Could not create table '{table}': {source}")]
    Schema {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database query failed: {0}")]
    Query(#[from] sqlx::Error),
}

/// Durable keyed collection of accepted master classes.
///
/// The store owns identity and timestamp assignment; callers only ever hand it a
/// validated [`NewMasterClass`].
#[async_trait]
pub trait MasterClassStore: Send + Sync {
    /// Stamps the record with the next id and the current time, then persists it.
    async fn insert(&self, new: NewMasterClass) -> Result<MasterClass, StoreError>;

    /// All stored records in insertion order.
    async fn list_all(&self) -> Result<Vec<MasterClass>, StoreError>;

    /// Removes every record. Used to reset state between tests.
    async fn clear(&self) -> Result<(), StoreError>;
}

/// Builds the store selected by the configuration, bootstrapping its schema if needed.
pub async fn init_database(config: &Config) -> Result<Arc<dyn MasterClassStore>, StoreError> {
    match config.storage {
        StorageBackend::Postgres => {
            let store = PostgresStore::connect(&config.database).await?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, records will not survive a restart");
            Ok(Arc::new(MemoryStore::default()))
        }
    }
}
