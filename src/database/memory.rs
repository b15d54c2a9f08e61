use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{MasterClassStore, StoreError};
use crate::model::master_class::{MasterClass, NewMasterClass};

#[derive(Debug, Default)]
struct Records {
    last_id: i64,
    rows: Vec<MasterClass>,
}

/// Process-local store. Ids start at 1 and are assigned under the write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Records>,
}

#[async_trait]
impl MasterClassStore for MemoryStore {
    async fn insert(&self, new: NewMasterClass) -> Result<MasterClass, StoreError> {
        let mut records = self.records.write().await;
        records.last_id += 1;

        let stored = MasterClass::stamp(records.last_id, chrono::Utc::now(), new);
        records.rows.push(stored.clone());

        tracing::info!("Stored master class {}", stored.id);
        Ok(stored)
    }

    async fn list_all(&self) -> Result<Vec<MasterClass>, StoreError> {
        Ok(self.records.read().await.rows.clone())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.records.write().await.rows.clear();
        Ok(())
    }
}
