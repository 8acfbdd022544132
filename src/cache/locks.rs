//! Per-hash write lock ( "at-most-one concurrent build per hash").
//!
//! Grounded in the teacher's `services/legacy/cache.rs`, which guards a
//! shared map with `parking_lot::Mutex`; here the map holds one `tokio::Mutex`
//! per hash so a write to hash A never blocks a write to hash B.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex as SyncMutex;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub struct HashLockMap {
    inner: SyncMutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl HashLockMap {
    pub fn new() -> Self {
        Self { inner: SyncMutex::new(HashMap::new()) }
    }

    /// Acquires the lock for `hash`, creating it on first use. The returned
    /// guard holds the per-hash mutex for the caller's critical section.
    /// Before inserting a new entry, any entry whose only reference was the
    /// map itself (`Arc::strong_count == 1`, i.e. no other task is currently
    /// holding or waiting on it) is pruned, so the map does not grow by one
    /// entry per distinct hash ever seen over the life of the process.
    pub async fn lock(&self, hash: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock();
            map.retain(|_, v| Arc::strong_count(v) > 1);
            map.entry(hash.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
        };
        entry.lock_owned().await
    }
}

impl Default for HashLockMap {
    fn default() -> Self {
        Self::new()
    }
}
