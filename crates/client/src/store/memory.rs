//! In-memory key-value store with LRU eviction.

use std::num::NonZeroUsize;
use std::sync::Arc;

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;

use platepal_core::cache::{CacheError, KeyValueStore, Result};

/// In-memory store bounded by an LRU policy.
///
/// Thread-safe via `Arc<RwLock<LruCache>>`. Once `max_entries` is reached the
/// least recently used record is evicted, which the aggregate cache treats
/// like any other miss.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    store: Arc<RwLock<LruCache<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Creates a store holding at most `max_entries` records.
    pub fn new(max_entries: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(max_entries).ok_or_else(|| {
            CacheError::ConnectionFailed("max_entries must be greater than zero".to_string())
        })?;
        Ok(Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
        })
    }

    /// Number of records currently held.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            store: Arc::new(RwLock::new(LruCache::new(NonZeroUsize::MIN.saturating_add(999)))),
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        // `LruCache::get` promotes the entry, so it needs the write lock.
        let mut store = self.store.write().await;
        Ok(store.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut store = self.store.write().await;
        store.put(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut store = self.store.write().await;
        store.pop(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.store.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryStore::new(10).unwrap();

        store.set("profile_u1", b"{}").await.unwrap();
        assert_eq!(store.get("profile_u1").await.unwrap(), Some(b"{}".to_vec()));

        store.remove("profile_u1").await.unwrap();
        assert_eq!(store.get("profile_u1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_missing_key_is_ok() {
        let store = MemoryStore::new(10).unwrap();
        assert!(store.remove("missing").await.is_ok());
    }

    #[tokio::test]
    async fn test_lru_eviction() {
        let store = MemoryStore::new(2).unwrap();

        store.set("a", b"1").await.unwrap();
        store.set("b", b"2").await.unwrap();
        // Touch "a" so "b" becomes the eviction candidate.
        store.get("a").await.unwrap();
        store.set("c", b"3").await.unwrap();

        assert!(store.get("a").await.unwrap().is_some());
        assert!(store.get("b").await.unwrap().is_none());
        assert!(store.get("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_clear_empties_store() {
        let store = MemoryStore::new(10).unwrap();
        store.set("a", b"1").await.unwrap();
        store.set("b", b"2").await.unwrap();

        store.clear().await.unwrap();
        assert!(store.is_empty().await);
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert!(MemoryStore::new(0).is_err());
    }
}
