//! RIPPLE Core - Data Types
//!
//! Pure data structures with no behavior beyond construction and derivation.
//! All other crates depend on this. This crate contains ONLY data types and
//! their validation logic - the cache engine itself lives in `ripple-cache`.
//!
//! The central idea of RIPPLE is the resource tag: every read operation
//! (query) declares which logical data entities (resources) it touches, and
//! every write operation (action) declares which resources it may mutate.
//! Invalidation then flows from mutated resources to the cached reads that
//! depend on them, without anyone naming cache entries by hand.

pub mod descriptor;
pub mod error;
pub mod key;
pub mod resource;

pub use descriptor::{ActionDescriptor, QueryDescriptor};
pub use error::{CacheError, DescriptorError, RippleError, RippleResult, SessionError};
pub use key::{CacheKey, ContentHash, QueryId};
pub use resource::Resource;
