//! Resource registry: which cached reads depend on which resources.
//!
//! Process-wide bookkeeping with no I/O. The registry is owned by whoever
//! wires the engine together and injected into the query runtime and the
//! dispatcher, so tests get isolated instances.

use ripple_core::{CacheError, CacheKey, Resource, RippleResult};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

/// Index from resource name to the set of cache keys that depend on it.
///
/// Subscriptions accumulate monotonically within a read's lifetime: repeated
/// registration for the same key adds resources, never resets them. Keys are
/// only removed through the explicit pruning hooks ([`remove_key`],
/// [`prune`], [`clear`]), driven by eviction on the store side.
///
/// [`remove_key`]: ResourceRegistry::remove_key
/// [`prune`]: ResourceRegistry::prune
/// [`clear`]: ResourceRegistry::clear
#[derive(Debug, Default)]
pub struct ResourceRegistry {
    subscriptions: RwLock<HashMap<Resource, HashSet<CacheKey>>>,
}

impl ResourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `key` depends on each of `resources`.
    ///
    /// Idempotent union: registering the same pair twice is a no-op, and
    /// prior associations are never removed.
    pub fn register_dependencies<I>(&self, key: &CacheKey, resources: I) -> RippleResult<()>
    where
        I: IntoIterator<Item = Resource>,
    {
        let mut subscriptions = self
            .subscriptions
            .write()
            .map_err(|_| CacheError::LockPoisoned)?;
        for resource in resources {
            subscriptions
                .entry(resource)
                .or_default()
                .insert(key.clone());
        }
        Ok(())
    }

    /// Cache keys subscribed to a resource. Empty set for unknown resources.
    pub fn subscribers(&self, resource: &Resource) -> RippleResult<HashSet<CacheKey>> {
        let subscriptions = self
            .subscriptions
            .read()
            .map_err(|_| CacheError::LockPoisoned)?;
        Ok(subscriptions.get(resource).cloned().unwrap_or_default())
    }

    /// Union of [`subscribers`](Self::subscribers) over several resources.
    ///
    /// Duplicates collapse: a key depending on two of the given resources
    /// appears once.
    pub fn subscribers_for_many<'a, I>(&self, resources: I) -> RippleResult<HashSet<CacheKey>>
    where
        I: IntoIterator<Item = &'a Resource>,
    {
        let subscriptions = self
            .subscriptions
            .read()
            .map_err(|_| CacheError::LockPoisoned)?;
        let mut keys = HashSet::new();
        for resource in resources {
            if let Some(subscribers) = subscriptions.get(resource) {
                keys.extend(subscribers.iter().cloned());
            }
        }
        Ok(keys)
    }

    /// Drop all subscriptions for one cache key, in response to its entry
    /// being evicted from the store.
    pub fn remove_key(&self, key: &CacheKey) -> RippleResult<()> {
        let mut subscriptions = self
            .subscriptions
            .write()
            .map_err(|_| CacheError::LockPoisoned)?;
        for subscribers in subscriptions.values_mut() {
            subscribers.remove(key);
        }
        subscriptions.retain(|_, subscribers| !subscribers.is_empty());
        Ok(())
    }

    /// Drop subscriptions for every key not in `live`. Returns the number of
    /// subscriptions removed.
    ///
    /// Intended to run periodically against the store's live key set so a
    /// long-lived session does not accumulate dead subscriptions.
    pub fn prune(&self, live: &HashSet<CacheKey>) -> RippleResult<u64> {
        let mut subscriptions = self
            .subscriptions
            .write()
            .map_err(|_| CacheError::LockPoisoned)?;
        let mut removed = 0u64;
        for subscribers in subscriptions.values_mut() {
            let before = subscribers.len();
            subscribers.retain(|key| live.contains(key));
            removed += (before - subscribers.len()) as u64;
        }
        subscriptions.retain(|_, subscribers| !subscribers.is_empty());
        Ok(removed)
    }

    /// Drop everything. Runs at the session boundary after total eviction.
    pub fn clear(&self) -> RippleResult<()> {
        self.subscriptions
            .write()
            .map_err(|_| CacheError::LockPoisoned)?
            .clear();
        Ok(())
    }

    /// Number of resources with at least one subscriber.
    pub fn resource_count(&self) -> RippleResult<usize> {
        Ok(self
            .subscriptions
            .read()
            .map_err(|_| CacheError::LockPoisoned)?
            .len())
    }

    /// Total number of (resource, key) subscription pairs.
    pub fn subscription_count(&self) -> RippleResult<usize> {
        Ok(self
            .subscriptions
            .read()
            .map_err(|_| CacheError::LockPoisoned)?
            .values()
            .map(HashSet::len)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use ripple_core::QueryId;
    use serde_json::json;

    fn key(query: &str) -> CacheKey {
        CacheKey::derive(&QueryId::new(query).expect("valid id"), &json!(null))
    }

    #[test]
    fn test_unknown_resource_has_no_subscribers() {
        let registry = ResourceRegistry::new();
        let subscribers = registry
            .subscribers(&Resource::new("Article"))
            .expect("subscribers");
        assert!(subscribers.is_empty());
    }

    #[test]
    fn test_registration_accumulates_never_resets() {
        let registry = ResourceRegistry::new();
        let k = key("getArticle");

        registry
            .register_dependencies(&k, [Resource::new("Article")])
            .expect("register");
        registry
            .register_dependencies(&k, [Resource::new("Comment")])
            .expect("register");

        // Second registration added Comment without losing Article.
        assert!(registry
            .subscribers(&Resource::new("Article"))
            .expect("subscribers")
            .contains(&k));
        assert!(registry
            .subscribers(&Resource::new("Comment"))
            .expect("subscribers")
            .contains(&k));
    }

    #[test]
    fn test_subscribers_for_many_collapses_duplicates() {
        let registry = ResourceRegistry::new();
        let k = key("getArticle");
        registry
            .register_dependencies(&k, [Resource::new("Article"), Resource::new("Comment")])
            .expect("register");

        let resources = [Resource::new("Article"), Resource::new("Comment")];
        let keys = registry
            .subscribers_for_many(resources.iter())
            .expect("subscribers");
        assert_eq!(keys.len(), 1);
    }

    #[test]
    fn test_remove_key_drops_all_subscriptions() {
        let registry = ResourceRegistry::new();
        let k1 = key("getArticle");
        let k2 = key("getArticles");
        registry
            .register_dependencies(&k1, [Resource::new("Article"), Resource::new("Comment")])
            .expect("register");
        registry
            .register_dependencies(&k2, [Resource::new("Article")])
            .expect("register");

        registry.remove_key(&k1).expect("remove");

        assert!(!registry
            .subscribers(&Resource::new("Article"))
            .expect("subscribers")
            .contains(&k1));
        assert!(registry
            .subscribers(&Resource::new("Article"))
            .expect("subscribers")
            .contains(&k2));
        // Comment bucket became empty and was dropped entirely.
        assert_eq!(registry.resource_count().expect("count"), 1);
    }

    #[test]
    fn test_prune_keeps_only_live_keys() {
        let registry = ResourceRegistry::new();
        let live_key = key("getArticles");
        let dead_key = key("getComments");
        registry
            .register_dependencies(&live_key, [Resource::new("Article")])
            .expect("register");
        registry
            .register_dependencies(&dead_key, [Resource::new("Comment")])
            .expect("register");

        let live: HashSet<CacheKey> = [live_key.clone()].into_iter().collect();
        let removed = registry.prune(&live).expect("prune");

        assert_eq!(removed, 1);
        assert_eq!(registry.subscription_count().expect("count"), 1);
        assert!(registry
            .subscribers(&Resource::new("Article"))
            .expect("subscribers")
            .contains(&live_key));
    }

    #[test]
    fn test_clear_empties_registry() {
        let registry = ResourceRegistry::new();
        registry
            .register_dependencies(&key("getArticles"), [Resource::new("Article")])
            .expect("register");
        registry.clear().expect("clear");
        assert_eq!(registry.resource_count().expect("count"), 0);
        assert_eq!(registry.subscription_count().expect("count"), 0);
    }

    proptest! {
        /// Registering resource sets A then B subscribes the key to A ∪ B.
        #[test]
        fn prop_dependency_accumulation(
            a in proptest::collection::hash_set("[A-Z][a-z]{0,8}", 0..6),
            b in proptest::collection::hash_set("[A-Z][a-z]{0,8}", 0..6),
        ) {
            let registry = ResourceRegistry::new();
            let k = key("getThing");

            registry
                .register_dependencies(&k, a.iter().map(Resource::new))
                .expect("register");
            registry
                .register_dependencies(&k, b.iter().map(Resource::new))
                .expect("register");

            for name in a.union(&b) {
                prop_assert!(registry
                    .subscribers(&Resource::new(name.clone()))
                    .expect("subscribers")
                    .contains(&k));
            }
            prop_assert_eq!(
                registry.resource_count().expect("count"),
                a.union(&b).count()
            );
        }

        /// A key under several invalidated resources resolves exactly once.
        #[test]
        fn prop_duplicate_resolution_collapses(
            names in proptest::collection::hash_set("[A-Z][a-z]{0,8}", 1..6),
        ) {
            let registry = ResourceRegistry::new();
            let k = key("getThing");
            registry
                .register_dependencies(&k, names.iter().map(Resource::new))
                .expect("register");

            // Duplicate the input resource list on purpose.
            let resources: Vec<Resource> = names
                .iter()
                .chain(names.iter())
                .map(Resource::new)
                .collect();
            let keys = registry
                .subscribers_for_many(resources.iter())
                .expect("subscribers");
            prop_assert_eq!(keys.len(), 1);
        }
    }
}
