//! Query identity and deterministic cache key derivation.
//!
//! A [`CacheKey`] uniquely identifies one cached read result. It is derived
//! from the query's stable identity plus a SHA-256 hash of the canonical JSON
//! encoding of the call arguments, so two calls with structurally equal
//! arguments collapse to the same cache slot. `serde_json` is used without
//! the `preserve_order` feature, which makes object keys sort
//! deterministically and gives structural equality for free.

use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::DescriptorError;

/// SHA-256 hash of a query's canonical argument encoding.
pub type ContentHash = [u8; 32];

/// Stable identity of a read operation.
///
/// The id comes from the build-time declaration layer and must be unique per
/// operation and stable across process restarts - it is half of every
/// [`CacheKey`] derived for the operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId(String);

impl QueryId {
    /// Create a query identity. Rejects empty or whitespace-only ids: a query
    /// without a resolvable identity is a programming error, and caching it
    /// under a degenerate key would silently break invalidation targeting.
    pub fn new(id: impl Into<String>) -> Result<Self, DescriptorError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DescriptorError::EmptyOperationId);
        }
        Ok(Self(id))
    }

    /// The operation identity as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A value uniquely identifying one cached read result.
///
/// Equality and hashing cover both components, so the same query called with
/// different arguments occupies different cache slots while repeated calls
/// with equivalent arguments share one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query: QueryId,
    args_hash: ContentHash,
}

impl CacheKey {
    /// Derive the cache key for a query invocation.
    ///
    /// The arguments are serialized to canonical JSON and hashed; structural
    /// argument equality therefore yields an identical key regardless of how
    /// the argument value was constructed.
    pub fn derive(query: &QueryId, args: &serde_json::Value) -> Self {
        let canonical = args.to_string();
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let digest = hasher.finalize();
        let mut args_hash = [0u8; 32];
        args_hash.copy_from_slice(&digest);
        Self {
            query: query.clone(),
            args_hash,
        }
    }

    /// The query identity this key belongs to.
    pub fn query(&self) -> &QueryId {
        &self.query
    }

    /// The argument hash component of this key.
    pub fn args_hash(&self) -> &ContentHash {
        &self.args_hash
    }
}

impl fmt::Display for CacheKey {
    /// Renders `<query>:<first 8 hex chars of the argument hash>` for logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.query, hex::encode(&self.args_hash[..4]))
    }
}
