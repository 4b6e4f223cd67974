//! Session configuration.
//!
//! Loaded from environment variables with sensible defaults; every value can
//! also be set directly when wiring the engine by hand.

/// Configuration for the shared storage scope and credential broadcast.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Application namespace prefixed onto every key in the shared storage
    /// scope, so multiple apps sharing one scope cannot collide.
    pub storage_namespace: String,

    /// Capacity of the cross-context credential broadcast channel. Slow
    /// contexts that lag past this many events skip ahead; last write wins,
    /// so skipped intermediate events are harmless.
    pub broadcast_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_namespace: "ripple".to_string(),
            broadcast_capacity: 64,
        }
    }
}

impl SessionConfig {
    /// Create SessionConfig from environment variables.
    ///
    /// Environment variables:
    /// - `RIPPLE_STORAGE_NAMESPACE`: key prefix in the shared scope (default: "ripple")
    /// - `RIPPLE_BROADCAST_CAPACITY`: broadcast channel capacity (default: 64)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let storage_namespace = std::env::var("RIPPLE_STORAGE_NAMESPACE")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.storage_namespace);

        let broadcast_capacity = std::env::var("RIPPLE_BROADCAST_CAPACITY")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&n| n > 0)
            .unwrap_or(defaults.broadcast_capacity);

        Self {
            storage_namespace,
            broadcast_capacity,
        }
    }
}
