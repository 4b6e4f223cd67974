//! In-memory cache store.
//!
//! Reference implementation of [`CacheStore`] backed by a HashMap behind a
//! tokio RwLock, with hit/miss accounting. This is the backend the engine
//! ships with; production deployments can swap in anything implementing the
//! trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ripple_core::{CacheKey, RippleResult};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::traits::{CacheStats, CacheStore, CachedEntry};

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Value,
    cached_at: DateTime<Utc>,
    stale: bool,
}

/// In-memory [`CacheStore`] backend.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: RwLock<HashMap<CacheKey, MemoryEntry>>,
    stats: RwLock<CacheStats>,
}

impl MemoryCacheStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an entry for the key exists and is marked stale.
    ///
    /// Test and introspection helper; the engine itself goes through
    /// [`CacheStore::lookup`].
    pub async fn is_stale(&self, key: &CacheKey) -> Option<bool> {
        self.entries.read().await.get(key).map(|e| e.stale)
    }

    /// Number of entries currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// True when the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn lookup(&self, key: &CacheKey) -> RippleResult<Option<CachedEntry>> {
        let entries = self.entries.read().await;
        let found = entries.get(key);
        let mut stats = self.stats.write().await;
        match found {
            Some(entry) if !entry.stale => stats.hits += 1,
            _ => stats.misses += 1,
        }
        Ok(found.map(|entry| CachedEntry {
            value: entry.value.clone(),
            cached_at: entry.cached_at,
            stale: entry.stale,
        }))
    }

    async fn store(&self, key: &CacheKey, value: Value) -> RippleResult<()> {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.clone(),
            MemoryEntry {
                value,
                cached_at: Utc::now(),
                stale: false,
            },
        );
        self.stats.write().await.entry_count = entries.len() as u64;
        Ok(())
    }

    async fn mark_stale(&self, key: &CacheKey) -> RippleResult<bool> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) => {
                entry.stale = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_stale(&self) -> RippleResult<u64> {
        let mut entries = self.entries.write().await;
        for entry in entries.values_mut() {
            entry.stale = true;
        }
        Ok(entries.len() as u64)
    }

    async fn evict_all(&self) -> RippleResult<u64> {
        let mut entries = self.entries.write().await;
        let removed = entries.len() as u64;
        entries.clear();
        let mut stats = self.stats.write().await;
        stats.evictions += removed;
        stats.entry_count = 0;
        Ok(removed)
    }

    async fn live_keys(&self) -> RippleResult<Vec<CacheKey>> {
        Ok(self.entries.read().await.keys().cloned().collect())
    }

    async fn stats(&self) -> RippleResult<CacheStats> {
        Ok(self.stats.read().await.clone())
    }
}
