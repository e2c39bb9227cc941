//! Cache backend trait.
//!
//! The recap subsystem coordinates through a key-value cache with TTLs and an
//! atomic insert-if-absent primitive. Implementations must make `add` truly
//! atomic under concurrent writers; a get-then-set emulation races and breaks
//! the computation lock.

use async_trait::async_trait;
use plenum_core::PlenumResult;
use serde_json::Value;
use std::time::Duration;

/// Key-value cache with per-entry TTLs.
///
/// Values are JSON payloads; the cache stores them opaquely. Entries may
/// vanish at any time (expiry, eviction, restart) without correctness loss
/// for callers - only availability loss.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a live (non-expired) value.
    async fn get(&self, key: &str) -> PlenumResult<Option<Value>>;

    /// Set a value, replacing any existing entry.
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> PlenumResult<()>;

    /// Delete a value. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> PlenumResult<()>;

    /// Insert only if the key is absent (or expired). Returns whether the
    /// insert happened. This is the mutual-exclusion primitive for the
    /// analysis computation lock.
    async fn add(&self, key: &str, value: Value, ttl: Duration) -> PlenumResult<bool>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently live.
    pub entry_count: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
