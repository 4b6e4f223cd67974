//! Error types for RIPPLE operations

use thiserror::Error;

/// Operation metadata errors.
///
/// These are programming errors in the declaration layer: they are never
/// retried and surface immediately to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("Operation id must not be empty")]
    EmptyOperationId,

    #[error("Query '{id}' declares no resource dependencies")]
    NoDeclaredResources { id: String },
}

/// Cache engine errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Failed to encode arguments for '{query}': {reason}")]
    ArgEncoding { query: String, reason: String },

    #[error("Failed to decode cached value for {key}: {reason}")]
    ValueDecoding { key: String, reason: String },

    #[error("Failed to encode fetched value for {key}: {reason}")]
    ValueEncoding { key: String, reason: String },

    #[error("Upstream fetch failed for '{operation}': {reason}")]
    Upstream { operation: String, reason: String },

    #[error("Cache lock poisoned")]
    LockPoisoned,
}

/// Session and credential errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Shared scope lock poisoned")]
    LockPoisoned,
}

/// Master error type for all RIPPLE errors.
#[derive(Debug, Clone, Error)]
pub enum RippleError {
    #[error("Descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),
}

/// Result type alias for RIPPLE operations.
pub type RippleResult<T> = Result<T, RippleError>;

// =============================================================================
// TESTS
// =============================================================================
