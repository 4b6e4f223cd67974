//! RIPPLE Cache - resource-tagged cache invalidation engine.
//!
//! This crate keeps cached read results consistent with server-side mutations
//! without anyone naming cache entries by hand. Reads register the resources
//! they depend on; writes name the resources they mutated; the engine does
//! the rest.
//!
//! # Components
//!
//! - [`ResourceRegistry`] - index from resource name to the cache keys that
//!   currently depend on it. Pure bookkeeping, no I/O.
//! - [`QueryRuntime`] - runs a read operation, derives its cache key from the
//!   operation identity and arguments, feeds the registry, and delegates to
//!   the underlying [`CacheStore`].
//! - [`InvalidationDispatcher`] - resolves "these resources changed" into
//!   "these cache entries are stale" and instructs the store accordingly.
//! - [`ActionRuntime`] - runs a write operation and dispatches invalidation
//!   only after the mutation has been acknowledged.
//!
//! # Design Philosophy
//!
//! The registry is an explicitly owned, single-instance object injected into
//! the runtime components rather than ambient global state, so tests get
//! isolated instances. Invalidation only marks entries stale - eviction is a
//! session-boundary concern and lives in `ripple-session`.

pub mod dispatch;
pub mod memory;
pub mod query;
pub mod registry;
pub mod traits;

pub use dispatch::{ActionFetcher, ActionRuntime, InvalidationDispatcher};
pub use memory::MemoryCacheStore;
pub use query::{CacheableResult, QueryFetcher, QueryRead, QueryRuntime};
pub use registry::ResourceRegistry;
pub use traits::{CacheStats, CacheStore, CachedEntry};
