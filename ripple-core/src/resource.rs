//! Resource names used as invalidation tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An opaque, stable name identifying a logical data entity (e.g. "Article").
///
/// Resources have no internal structure; equality is by name. A resource is
/// purely an invalidation tag connecting the reads that depend on an entity
/// to the writes that mutate it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resource(String);

impl Resource {
    /// Create a resource tag from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The resource name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Resource {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Resource {
    fn from(name: String) -> Self {
        Self(name)
    }
}
