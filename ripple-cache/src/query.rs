//! Query execution wrapper.
//!
//! Bridges a declarative read operation to the cache store while feeding the
//! registry: derive the cache key, register declared dependencies, then serve
//! from cache or fetch through.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ripple_core::{CacheError, CacheKey, QueryDescriptor, RippleResult};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::registry::ResourceRegistry;
use crate::traits::CacheStore;

/// Marker trait for types a query can return through the cache.
pub trait CacheableResult: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T: Serialize + DeserializeOwned + Send + Sync + 'static> CacheableResult for T {}

/// Fetcher that executes the actual read against the source of truth.
///
/// Invoked on cache miss (or stale entry); the runtime caches whatever it
/// returns. Implementations wrap the transport call for one operation.
#[async_trait]
pub trait QueryFetcher<T: CacheableResult>: Send + Sync {
    /// Execute the read with the canonical-JSON arguments.
    async fn fetch(&self, args: &Value) -> RippleResult<T>;
}

/// Result of a query run, carrying freshness metadata.
#[derive(Debug, Clone)]
pub struct QueryRead<T> {
    value: T,
    cached_at: DateTime<Utc>,
    was_cache_hit: bool,
}

impl<T> QueryRead<T> {
    fn from_cache(value: T, cached_at: DateTime<Utc>) -> Self {
        Self {
            value,
            cached_at,
            was_cache_hit: true,
        }
    }

    fn from_fetch(value: T) -> Self {
        Self {
            value,
            cached_at: Utc::now(),
            was_cache_hit: false,
        }
    }

    /// Consume the wrapper and return the underlying value.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Get a reference to the underlying value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// When this value was cached (or fetched).
    pub fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    /// Duration since the value was cached.
    pub fn staleness(&self) -> Duration {
        let now = Utc::now();
        if now > self.cached_at {
            (now - self.cached_at).to_std().unwrap_or(Duration::ZERO)
        } else {
            Duration::ZERO
        }
    }

    /// Whether the value was served from cache.
    pub fn was_cache_hit(&self) -> bool {
        self.was_cache_hit
    }

    /// Whether the value was fetched from the source of truth.
    pub fn was_cache_miss(&self) -> bool {
        !self.was_cache_hit
    }
}

/// Query execution wrapper over a cache store and a resource registry.
///
/// Descriptor validity is enforced at construction time by
/// [`QueryDescriptor::new`], so every run sees a resolvable identity and a
/// non-empty declared-resource set.
pub struct QueryRuntime<S: CacheStore> {
    store: Arc<S>,
    registry: Arc<ResourceRegistry>,
}

impl<S: CacheStore> QueryRuntime<S> {
    /// Create a runtime over the given store and registry.
    pub fn new(store: Arc<S>, registry: Arc<ResourceRegistry>) -> Self {
        Self { store, registry }
    }

    /// Get a reference to the cache store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get a reference to the resource registry.
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Run a read operation through the cache.
    ///
    /// Derives the cache key from (operation identity, arguments), registers
    /// the declared resource dependencies, and serves the cached value when
    /// present and not stale; otherwise fetches, caches, and returns.
    ///
    /// Registration happens on every run, hits included, so a key's resource
    /// set accumulates exactly as declared.
    pub async fn run<A, T, F>(
        &self,
        descriptor: &QueryDescriptor,
        args: &A,
        fetcher: &F,
    ) -> RippleResult<QueryRead<T>>
    where
        A: Serialize + ?Sized,
        T: CacheableResult,
        F: QueryFetcher<T>,
    {
        let args_value =
            serde_json::to_value(args).map_err(|e| CacheError::ArgEncoding {
                query: descriptor.id().to_string(),
                reason: e.to_string(),
            })?;
        let key = CacheKey::derive(descriptor.id(), &args_value);

        self.registry
            .register_dependencies(&key, descriptor.resources().iter().cloned())?;

        if let Some(entry) = self.store.lookup(&key).await? {
            if !entry.stale {
                let value: T =
                    serde_json::from_value(entry.value).map_err(|e| CacheError::ValueDecoding {
                        key: key.to_string(),
                        reason: e.to_string(),
                    })?;
                return Ok(QueryRead::from_cache(value, entry.cached_at));
            }
            // Stale hit: fall through to the source of truth.
        }

        let fetched = fetcher.fetch(&args_value).await?;
        let raw = serde_json::to_value(&fetched).map_err(|e| CacheError::ValueEncoding {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.store.store(&key, raw).await?;
        Ok(QueryRead::from_fetch(fetched))
    }
}

impl<S: CacheStore> Clone for QueryRuntime<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
        }
    }
}
