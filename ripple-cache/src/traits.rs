//! Cache store trait and entry/statistics types.
//!
//! The engine consumes a cache store, it does not own one. This trait
//! mandates *when* staleness and eviction must happen; how the store
//! represents entries, and when it refetches stale ones, is the store's own
//! policy.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ripple_core::{CacheKey, RippleResult};
use serde_json::Value;

/// A cached read result as seen across the store boundary.
///
/// Values cross the boundary as JSON; typed results are (de)serialized at
/// the query-runtime edge.
#[derive(Debug, Clone)]
pub struct CachedEntry {
    /// The cached value.
    pub value: Value,
    /// When this value was stored.
    pub cached_at: DateTime<Utc>,
    /// Whether the entry has been marked stale by an invalidation.
    pub stale: bool,
}

/// Cache store trait for pluggable backends.
///
/// Implementations should be thread-safe and support concurrent access.
/// Marking an entry stale must never block on any refetch the store may
/// schedule - staleness marking is fire-and-forget from the engine's side.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up an entry by key. Returns staleness metadata along with the
    /// value; a stale entry is still returned so callers can decide policy.
    async fn lookup(&self, key: &CacheKey) -> RippleResult<Option<CachedEntry>>;

    /// Store a fresh value under the key, stamping the current time.
    /// Replaces any previous entry (and clears its staleness flag).
    async fn store(&self, key: &CacheKey, value: Value) -> RippleResult<()>;

    /// Mark a single entry stale. Returns true if an entry existed.
    ///
    /// Stale entries are refetched on next use per the store's refresh
    /// policy; the data remains servable until then.
    async fn mark_stale(&self, key: &CacheKey) -> RippleResult<bool>;

    /// Mark every entry stale. Returns the number of entries touched.
    async fn mark_all_stale(&self) -> RippleResult<u64>;

    /// Remove every entry entirely. Returns the number of entries removed.
    ///
    /// Used at session boundaries where residual data is a privacy problem,
    /// not merely a freshness one.
    async fn evict_all(&self) -> RippleResult<u64>;

    /// Keys of all entries currently present, for registry pruning.
    async fn live_keys(&self) -> RippleResult<Vec<CacheKey>>;

    /// Get cache statistics.
    async fn stats(&self) -> RippleResult<CacheStats>;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses (including stale entries bypassed).
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
    /// Number of entries removed by eviction.
    pub evictions: u64,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.hit_rate() - 0.0).abs() < 0.001);
    }
}
