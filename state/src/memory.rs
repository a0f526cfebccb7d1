//! In-memory state store
//!
//! The only store shipped with the core: the persistence format of the
//! underlying ledger is owned by the external collaborator.

use crate::store::StateStore;
use aerosure_core::AerosureResult;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory state store over a sharded map
pub struct MemoryStateStore {
    data: DashMap<Vec<u8>, Vec<u8>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for MemoryStateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: &[u8]) -> AerosureResult<Option<Vec<u8>>> {
        Ok(self.data.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &[u8], value: &[u8]) -> AerosureResult<()> {
        self.data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> AerosureResult<()> {
        self.data.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &[u8]) -> AerosureResult<bool> {
        Ok(self.data.contains_key(key))
    }
}

/// Shared memory store handle
pub type SharedMemoryStateStore = Arc<MemoryStateStore>;

/// Create a shared memory state store
pub fn create_memory_store() -> SharedMemoryStateStore {
    Arc::new(MemoryStateStore::new())
}
