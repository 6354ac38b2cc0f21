//! Ordered map implementation of [`EntityStore`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::entities::SyncEntity;
use crate::domain::ports::{EntityStore, EntityStoreError};

/// Store holding one collection in memory, ordered by id.
pub struct InMemoryEntityStore<T: SyncEntity> {
    records: RwLock<BTreeMap<T::Id, T>>,
}

impl<T: SyncEntity> Default for InMemoryEntityStore<T> {
    fn default() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<T: SyncEntity> InMemoryEntityStore<T> {
    /// Build a store pre-populated with `records`; later duplicates win.
    pub fn with_records(records: Vec<T>) -> Self {
        Self {
            records: RwLock::new(
                records
                    .into_iter()
                    .map(|record| (record.id().clone(), record))
                    .collect(),
            ),
        }
    }

    /// Current records in id order.
    pub async fn records(&self) -> Vec<T> {
        self.records.read().await.values().cloned().collect()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl<T: SyncEntity> EntityStore<T> for InMemoryEntityStore<T> {
    async fn insert(&self, item: &T) -> Result<(), EntityStoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(item.id()) {
            return Err(EntityStoreError::unique_conflict(item.id().to_string()));
        }
        records.insert(item.id().clone(), item.clone());
        Ok(())
    }

    async fn update(&self, item: &T) -> Result<(), EntityStoreError> {
        let mut records = self.records.write().await;
        let slot = records
            .get_mut(item.id())
            .ok_or_else(|| EntityStoreError::missing(item.id().to_string()))?;
        *slot = item.clone();
        Ok(())
    }

    async fn delete(&self, item: &T) -> Result<(), EntityStoreError> {
        self.records
            .write()
            .await
            .remove(item.id())
            .map(drop)
            .ok_or_else(|| EntityStoreError::missing(item.id().to_string()))
    }

    async fn find(&self, id: &T::Id) -> Result<Option<T>, EntityStoreError> {
        Ok(self.records.read().await.get(id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<T>, EntityStoreError> {
        Ok(self.records().await)
    }
}
