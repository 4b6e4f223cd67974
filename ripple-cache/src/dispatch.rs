//! Invalidation dispatcher and action runtime.
//!
//! Translates "these resources changed" into "these cache entries are stale".
//! Dispatch only marks staleness; the store controls eventual refetch timing,
//! and eviction is a session-boundary concern that lives elsewhere.

use async_trait::async_trait;
use ripple_core::{ActionDescriptor, CacheError, Resource, RippleResult};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use crate::registry::ResourceRegistry;
use crate::traits::CacheStore;

/// Resolves mutated resources to their subscribed cache entries and marks
/// them stale.
pub struct InvalidationDispatcher<S: CacheStore> {
    registry: Arc<ResourceRegistry>,
    store: Arc<S>,
}

impl<S: CacheStore> InvalidationDispatcher<S> {
    /// Create a dispatcher over the given registry and store.
    pub fn new(registry: Arc<ResourceRegistry>, store: Arc<S>) -> Self {
        Self { registry, store }
    }

    /// Get a reference to the resource registry.
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Mark stale every cache entry subscribed to any of `resources`.
    ///
    /// Each affected entry is marked exactly once, regardless of duplicate
    /// resources in the input or a key's presence under several of them.
    /// Empty or unknown resource sets are a no-op. Returns the number of
    /// entries that were actually marked.
    ///
    /// Callers must invoke this only after the triggering mutation has been
    /// acknowledged by its source of truth; [`ActionRuntime::run`] encodes
    /// that ordering.
    pub async fn invalidate_by_resources<'a, I>(&self, resources: I) -> RippleResult<u64>
    where
        I: IntoIterator<Item = &'a Resource>,
    {
        let keys = self.registry.subscribers_for_many(resources)?;
        if keys.is_empty() {
            return Ok(0);
        }

        let mut marked = 0u64;
        for key in &keys {
            if self.store.mark_stale(key).await? {
                marked += 1;
            }
        }
        tracing::debug!(subscribed = keys.len(), marked, "invalidation dispatched");
        Ok(marked)
    }
}

impl<S: CacheStore> Clone for InvalidationDispatcher<S> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            store: Arc::clone(&self.store),
        }
    }
}

/// Fetcher that performs the actual mutation against the source of truth.
#[async_trait]
pub trait ActionFetcher<T: Send>: Send + Sync {
    /// Execute the write with the canonical-JSON arguments. Returning `Ok`
    /// means the mutation is durably acknowledged.
    async fn perform(&self, args: &Value) -> RippleResult<T>;
}

/// Runs a write operation and dispatches invalidation for its declared
/// resources after - and only after - the mutation succeeds.
pub struct ActionRuntime<S: CacheStore> {
    dispatcher: InvalidationDispatcher<S>,
}

impl<S: CacheStore> ActionRuntime<S> {
    /// Create a runtime over the given dispatcher.
    pub fn new(dispatcher: InvalidationDispatcher<S>) -> Self {
        Self { dispatcher }
    }

    /// Get a reference to the underlying dispatcher.
    pub fn dispatcher(&self) -> &InvalidationDispatcher<S> {
        &self.dispatcher
    }

    /// Perform the mutation, then invalidate the declared resources.
    ///
    /// A failed mutation propagates its error without touching any staleness
    /// flag - readers are never told "stale" for a write that did not land.
    pub async fn run<A, T, F>(
        &self,
        descriptor: &ActionDescriptor,
        args: &A,
        fetcher: &F,
    ) -> RippleResult<T>
    where
        A: Serialize + ?Sized,
        T: Send,
        F: ActionFetcher<T>,
    {
        let args_value = serde_json::to_value(args).map_err(|e| CacheError::ArgEncoding {
            query: descriptor.id().to_string(),
            reason: e.to_string(),
        })?;

        let result = fetcher.perform(&args_value).await?;
        let marked = self
            .dispatcher
            .invalidate_by_resources(descriptor.resources().iter())
            .await?;
        tracing::debug!(action = %descriptor.id(), marked, "action completed");
        Ok(result)
    }
}
