//! In-memory cache backend.
//!
//! Development and test backend; a deployment fronted by Redis or Memcached
//! plugs in behind the same trait. All operations go through one mutex, which
//! is what makes `add` atomic under concurrent writers.

use async_trait::async_trait;
use plenum_core::{PlenumResult, StorageError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::traits::{CacheStats, CacheStore};

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Instant,
}

/// In-memory `CacheStore` implementation with per-entry TTLs.
///
/// Time can be advanced artificially with [`InMemoryCacheStore::advance`],
/// so TTL behavior is testable without sleeping.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: Mutex<HashMap<String, Entry>>,
    /// Artificial clock skew added to `Instant::now()`; tests only.
    skew: Mutex<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl InMemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the store's clock. Entries whose TTL falls inside the skew
    /// window become expired, exactly as if the time had passed.
    pub fn advance(&self, by: Duration) {
        let mut skew = self.skew.lock().unwrap_or_else(|e| e.into_inner());
        *skew += by;
    }

    fn now(&self) -> Instant {
        let skew = *self.skew.lock().unwrap_or_else(|e| e.into_inner());
        Instant::now() + skew
    }

    /// Snapshot of hit/miss counters and the live entry count.
    pub fn stats(&self) -> CacheStats {
        let now = self.now();
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: entries.values().filter(|e| e.expires_at > now).count() as u64,
        }
    }

    fn lock_entries(&self) -> PlenumResult<std::sync::MutexGuard<'_, HashMap<String, Entry>>> {
        self.entries
            .lock()
            .map_err(|_| StorageError::LockPoisoned.into())
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> PlenumResult<Option<Value>> {
        let now = self.now();
        let mut entries = self.lock_entries()?;
        if let Some(entry) = entries.get(key) {
            if entry.expires_at > now {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(Some(entry.value.clone()));
            }
        }
        // Expired entries are dropped lazily on read.
        entries.remove(key);
        self.misses.fetch_add(1, Ordering::Relaxed);
        Ok(None)
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> PlenumResult<()> {
        let expires_at = self.now() + ttl;
        let mut entries = self.lock_entries()?;
        entries.insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> PlenumResult<()> {
        let mut entries = self.lock_entries()?;
        entries.remove(key);
        Ok(())
    }

    async fn add(&self, key: &str, value: Value, ttl: Duration) -> PlenumResult<bool> {
        let now = self.now();
        let mut entries = self.lock_entries()?;
        let held = entries
            .get(key)
            .map(|entry| entry.expires_at > now)
            .unwrap_or(false);
        if held {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_set_get_roundtrip() {
        let cache = InMemoryCacheStore::new();
        cache.set("k", json!({"a": 1}), TTL).await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let cache = InMemoryCacheStore::new();
        assert_eq!(cache.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entries_expire_after_ttl() {
        let cache = InMemoryCacheStore::new();
        cache.set("k", json!(1), Duration::from_secs(10)).await.unwrap();
        cache.advance(Duration::from_secs(11));
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_add_succeeds_only_if_absent() {
        let cache = InMemoryCacheStore::new();
        assert!(cache.add("lock", json!("t1"), TTL).await.unwrap());
        assert!(!cache.add("lock", json!("t2"), TTL).await.unwrap());
        // First writer's value survives.
        assert_eq!(cache.get("lock").await.unwrap(), Some(json!("t1")));
    }

    #[tokio::test]
    async fn test_add_reclaims_expired_entry() {
        let cache = InMemoryCacheStore::new();
        assert!(cache.add("lock", json!("t1"), Duration::from_secs(5)).await.unwrap());
        cache.advance(Duration::from_secs(6));
        assert!(cache.add("lock", json!("t2"), TTL).await.unwrap());
        assert_eq!(cache.get("lock").await.unwrap(), Some(json!("t2")));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let cache = InMemoryCacheStore::new();
        cache.set("k", json!(1), TTL).await.unwrap();
        cache.delete("k").await.unwrap();
        cache.delete("k").await.unwrap();
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_add_admits_exactly_one() {
        let cache = Arc::new(InMemoryCacheStore::new());
        let mut handles = Vec::new();
        for i in 0..32 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.add("lock", json!(i), TTL).await.unwrap()
            }));
        }
        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_stats_track_hits_and_misses() {
        let cache = InMemoryCacheStore::new();
        cache.set("k", json!(1), TTL).await.unwrap();
        cache.get("k").await.unwrap();
        cache.get("absent").await.unwrap();
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);
    }
}
