//! Per-entity write locks
//!
//! Mutations must behave as if serialized per logical resource (one airline,
//! one flight) without a single global lock across unrelated entities. Each
//! entity key gets its own async mutex, created on first use.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Map of per-key async mutexes
pub struct KeyedLocks {
    locks: DashMap<Vec<u8>, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Acquire the lock for one entity key
    ///
    /// Holders for different keys never contend; holders for the same key
    /// are serialized in acquisition order.
    pub async fn lock(&self, key: &[u8]) -> OwnedMutexGuard<()> {
        let mutex = self
            .locks
            .entry(key.to_vec())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }
}

impl Default for KeyedLocks {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_same_key_serializes() {
        let locks = Arc::new(KeyedLocks::new());
        let counter = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let counter = counter.clone();
            let max_seen = max_seen.clone();
            handles.push(tokio::spawn(async move {
                let _guard = locks.lock(b"airline:a").await;
                let inside = counter.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(inside, Ordering::SeqCst);
                tokio::task::yield_now().await;
                counter.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Never more than one holder inside the critical section
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_do_not_block() {
        let locks = KeyedLocks::new();

        let _a = locks.lock(b"airline:a").await;
        // Must not deadlock: a different key has its own mutex
        let _b = locks.lock(b"airline:b").await;
    }
}
