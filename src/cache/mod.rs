//! Content-addressed cache store (component D).
//!
//! Bytes are addressed by SHA-256 and sharded two levels deep on disk.
//! Concurrent writers for the same hash are serialized through an in-memory
//! per-hash lock (teacher's `services/legacy/cache.rs` shows the same
//! `parking_lot`-guarded-map idiom, applied here to write coordination rather
//! than TTL caching).

mod locks;

pub use locks::HashLockMap;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{CuratorError, Result};
use crate::hash::content_hash_bytes;
use crate::models::cache_file::{shard_path, CacheKind};

/// Outcome of `store_asset`: whether the bytes were freshly written or a
/// pre-existing file with the same hash was found (deduplicated).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Written,
    Deduplicated,
}

#[derive(Debug, Clone)]
pub struct StoredAsset {
    pub hash: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub outcome: StoreOutcome,
}

pub struct CacheStore {
    root: PathBuf,
    locks: Arc<HashLockMap>,
}

impl CacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), locks: Arc::new(HashLockMap::new()) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes `bytes` under their content hash. Write-to-temp then rename
    /// guarantees no reader ever observes a partially-written file; the
    /// per-hash lock guarantees at most one writer actually performs the
    /// rename for a given hash.
    pub async fn store_asset(&self, kind: CacheKind, bytes: &[u8], ext: &str) -> Result<StoredAsset> {
        let hash = content_hash_bytes(bytes);
        let dest = shard_path(&self.root, kind, &hash, ext);
        let size_bytes = bytes.len() as u64;

        let _guard = self.locks.lock(&hash).await;

        if dest.exists() {
            self.touch_dummy(&dest);
            return Ok(StoredAsset { hash, path: dest, size_bytes, outcome: StoreOutcome::Deduplicated });
        }

        let parent = dest.parent().ok_or_else(|| CuratorError::validation("cache path has no parent"))?;
        tokio::fs::create_dir_all(parent).await?;

        let tmp = parent.join(format!(".{hash}.{}.tmp", std::process::id()));
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &dest).await?;

        Ok(StoredAsset { hash, path: dest, size_bytes, outcome: StoreOutcome::Written })
    }

    pub async fn retrieve(&self, kind: CacheKind, hash: &str, ext: &str) -> Result<Vec<u8>> {
        let path = shard_path(&self.root, kind, hash, ext);
        Ok(tokio::fs::read(&path).await?)
    }

    /// Garbage-collects a single on-disk asset; callers are responsible for
    /// having already verified ref-count=0 and no library-file referrer.
    pub async fn delete_asset(&self, kind: CacheKind, hash: &str, ext: &str) -> Result<()> {
        let path = shard_path(&self.root, kind, hash, ext);
        let _guard = self.locks.lock(hash).await;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn touch_dummy(&self, _path: &Path) {
        // Last-accessed-at bookkeeping is done by the repository layer against
        // the DB row, not the filesystem mtime.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_then_retrieve_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let bytes = b"poster bytes".to_vec();

        let stored = store.store_asset(CacheKind::Image, &bytes, "jpg").await.unwrap();
        assert_eq!(stored.outcome, StoreOutcome::Written);

        let back = store.retrieve(CacheKind::Image, &stored.hash, "jpg").await.unwrap();
        assert_eq!(back, bytes);
    }

    #[tokio::test]
    async fn storing_identical_bytes_twice_deduplicates() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        let bytes = b"same bytes".to_vec();

        let first = store.store_asset(CacheKind::Image, &bytes, "jpg").await.unwrap();
        let second = store.store_asset(CacheKind::Image, &bytes, "jpg").await.unwrap();

        assert_eq!(first.hash, second.hash);
        assert_eq!(second.outcome, StoreOutcome::Deduplicated);
    }

    #[tokio::test]
    async fn concurrent_stores_of_the_same_hash_both_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(CacheStore::new(dir.path()));
        let bytes = Arc::new(b"race bytes".to_vec());

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let bytes = bytes.clone();
            handles.push(tokio::spawn(async move {
                store.store_asset(CacheKind::Video, &bytes, "mp4").await.unwrap()
            }));
        }

        let mut results = Vec::new();
        for h in handles {
            results.push(h.await.unwrap());
        }

        assert!(results.iter().any(|r| r.outcome == StoreOutcome::Written));
        assert!(results.iter().all(|r| r.hash == results[0].hash));
    }

    #[tokio::test]
    async fn delete_is_idempotent_on_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CacheStore::new(dir.path());
        store.delete_asset(CacheKind::Image, "deadbeef00", "jpg").await.unwrap();
    }
}
