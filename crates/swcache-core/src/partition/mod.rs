//! Versioned cache partitions.
//!
//! A partition is a named key → response store. Each logical partition
//! (`static`, `api`, `images`) is stored under a version-qualified identity
//! such as `hypertoons-static-v1`. On activation every partition that carries
//! the application prefix but is not one of the three current identities is
//! deleted; the current three are never touched.
//!
//! Storage is pluggable through [`PartitionStore`]:
//!
//! - [`MemoryStore`]: process-local, for tests and embedding
//! - [`DiskStore`]: one directory per partition, atomic entry writes
//!
//! # Disk Layout
//!
//! ```text
//! {root}/{identity}/{hex(sha256(key))}.entry
//!   line 1       # JSON: key, status, headers, stored_at
//!   rest         # raw body bytes
//! ```
//!
//! An entry is replaced by renaming a per-write temp file over it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::error::CacheResult;
use crate::types::{PartitionKind, PartitionSet, Request, Response, WorkerConfig};

mod disk;
mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

/// Backend holding partitions and their entries.
///
/// Concurrent writes to the same key are last-writer-wins.
#[async_trait]
pub trait PartitionStore: Send + Sync + std::fmt::Debug {
    /// Create the partition if it does not exist. Idempotent.
    async fn open(&self, partition: &str) -> CacheResult<()>;

    /// Stored response for `key`, if any. A missing partition is a miss.
    async fn lookup(&self, partition: &str, key: &str) -> CacheResult<Option<Response>>;

    /// Store `response` under `key`, replacing any existing entry.
    async fn put(&self, partition: &str, key: &str, response: &Response) -> CacheResult<()>;

    /// Keys stored in the partition.
    async fn keys(&self, partition: &str) -> CacheResult<Vec<String>>;

    /// Names of every existing partition, whoever owns it.
    async fn partition_names(&self) -> CacheResult<Vec<String>>;

    /// Delete a partition and all its entries. Returns whether it existed.
    async fn delete(&self, partition: &str) -> CacheResult<bool>;
}

/// Handle to one open partition.
#[derive(Debug, Clone)]
pub struct Partition {
    store: Arc<dyn PartitionStore>,
    identity: String,
}

impl Partition {
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub async fn lookup(&self, request: &Request) -> CacheResult<Option<Response>> {
        self.store
            .lookup(&self.identity, &request.cache_key())
            .await
    }

    pub async fn put(&self, request: &Request, response: &Response) -> CacheResult<()> {
        self.store
            .put(&self.identity, &request.cache_key(), response)
            .await?;
        debug!(partition = %self.identity, key = %request.cache_key(), "stored entry");
        Ok(())
    }

    pub async fn keys(&self) -> CacheResult<Vec<String>> {
        self.store.keys(&self.identity).await
    }
}

/// Owns the three current partitions and the upgrade protocol.
#[derive(Debug, Clone)]
pub struct PartitionManager {
    store: Arc<dyn PartitionStore>,
    prefix: String,
    partitions: PartitionSet,
}

impl PartitionManager {
    pub fn new(store: Arc<dyn PartitionStore>, config: &WorkerConfig) -> Self {
        Self {
            store,
            prefix: config.app_prefix.clone(),
            partitions: config.partitions.clone(),
        }
    }

    pub fn store(&self) -> &Arc<dyn PartitionStore> {
        &self.store
    }

    /// Open (creating if absent) the current partition of `kind`.
    pub async fn open(&self, kind: PartitionKind) -> CacheResult<Partition> {
        let identity = self.identity(kind);
        self.store.open(&identity).await?;
        Ok(Partition {
            store: Arc::clone(&self.store),
            identity,
        })
    }

    pub fn identity(&self, kind: PartitionKind) -> String {
        self.partitions.spec(kind).identity(&self.prefix)
    }

    pub fn current_identities(&self) -> Vec<String> {
        self.partitions.identities(&self.prefix)
    }

    pub async fn partition_names(&self) -> CacheResult<Vec<String>> {
        self.store.partition_names().await
    }

    pub async fn delete(&self, identity: &str) -> CacheResult<bool> {
        self.store.delete(identity).await
    }

    /// Application-prefixed partitions that exist right now.
    pub async fn owned_partitions(&self) -> CacheResult<Vec<String>> {
        let mut names: Vec<String> = self
            .store
            .partition_names()
            .await?
            .into_iter()
            .filter(|name| name.starts_with(&self.prefix))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Delete every owned partition whose identity is not current.
    ///
    /// Works on names only, never on entries. A failed delete is logged and
    /// skipped so the sweep always runs to the end. Returns the deleted names.
    pub async fn reclaim_stale(&self) -> CacheResult<Vec<String>> {
        let current = self.current_identities();
        let mut deleted = Vec::new();

        for name in self.owned_partitions().await? {
            if current.contains(&name) {
                continue;
            }
            match self.store.delete(&name).await {
                Ok(_) => {
                    info!(partition = %name, "deleted stale partition");
                    deleted.push(name);
                }
                Err(e) => warn!(partition = %name, error = %e, "failed to delete stale partition"),
            }
        }

        Ok(deleted)
    }

    /// Sum of entry counts across owned partitions.
    ///
    /// A partition that cannot be listed is logged and counted as empty.
    pub async fn entry_count(&self) -> CacheResult<u64> {
        let mut total = 0_u64;
        for name in self.owned_partitions().await? {
            match self.store.keys(&name).await {
                Ok(keys) => total += keys.len() as u64,
                Err(e) => warn!(partition = %name, error = %e, "failed to count partition entries"),
            }
        }
        Ok(total)
    }

    /// Delete every owned partition, current ones included.
    pub async fn clear_all(&self) -> CacheResult<Vec<String>> {
        let mut deleted = Vec::new();
        for name in self.owned_partitions().await? {
            if self.store.delete(&name).await? {
                deleted.push(name);
            }
        }
        debug!(count = deleted.len(), "cleared owned partitions");
        Ok(deleted)
    }
}
