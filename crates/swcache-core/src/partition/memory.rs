//! In-process partition store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::CacheResult;
use crate::types::Response;

use super::PartitionStore;

/// Partitions kept in memory behind a single lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: RwLock<BTreeMap<String, BTreeMap<String, Response>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PartitionStore for MemoryStore {
    async fn open(&self, partition: &str) -> CacheResult<()> {
        self.partitions
            .write()
            .await
            .entry(partition.to_string())
            .or_default();
        Ok(())
    }

    async fn lookup(&self, partition: &str, key: &str) -> CacheResult<Option<Response>> {
        Ok(self
            .partitions
            .read()
            .await
            .get(partition)
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    async fn put(&self, partition: &str, key: &str, response: &Response) -> CacheResult<()> {
        self.partitions
            .write()
            .await
            .entry(partition.to_string())
            .or_default()
            .insert(key.to_string(), response.clone());
        Ok(())
    }

    async fn keys(&self, partition: &str) -> CacheResult<Vec<String>> {
        Ok(self
            .partitions
            .read()
            .await
            .get(partition)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn partition_names(&self) -> CacheResult<Vec<String>> {
        Ok(self.partitions.read().await.keys().cloned().collect())
    }

    async fn delete(&self, partition: &str) -> CacheResult<bool> {
        Ok(self.partitions.write().await.remove(partition).is_some())
    }
}
