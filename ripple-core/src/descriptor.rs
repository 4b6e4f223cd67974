//! Typed operation descriptors.
//!
//! The build-time declaration layer tells us, for every operation, a stable
//! identity and the set of resources it touches. These descriptors carry that
//! metadata as validated values: a descriptor that exists is well-formed, so
//! the runtime never has to shape-check an operation at call time.

use std::collections::BTreeSet;

use crate::error::DescriptorError;
use crate::key::QueryId;
use crate::resource::Resource;

/// Descriptor for a read operation: its identity plus the statically declared
/// set of resources it depends on.
///
/// Construction fails on missing metadata (empty id, empty resource set) so
/// misdeclared queries are rejected before anything is cached under them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    id: QueryId,
    resources: BTreeSet<Resource>,
}

impl QueryDescriptor {
    /// Build a query descriptor from declared metadata.
    pub fn new(
        id: impl Into<String>,
        resources: impl IntoIterator<Item = Resource>,
    ) -> Result<Self, DescriptorError> {
        let id = QueryId::new(id)?;
        let resources: BTreeSet<Resource> = resources.into_iter().collect();
        if resources.is_empty() {
            return Err(DescriptorError::NoDeclaredResources {
                id: id.to_string(),
            });
        }
        Ok(Self { id, resources })
    }

    /// The stable operation identity.
    pub fn id(&self) -> &QueryId {
        &self.id
    }

    /// The declared resource dependencies.
    pub fn resources(&self) -> &BTreeSet<Resource> {
        &self.resources
    }
}

/// Descriptor for a write operation: its identity plus the set of resources
/// it may mutate.
///
/// Unlike queries, an empty resource set is allowed here - an action that
/// declares no mutated resources simply dispatches a no-op invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionDescriptor {
    id: QueryId,
    resources: BTreeSet<Resource>,
}

impl ActionDescriptor {
    /// Build an action descriptor from declared metadata.
    pub fn new(
        id: impl Into<String>,
        resources: impl IntoIterator<Item = Resource>,
    ) -> Result<Self, DescriptorError> {
        Ok(Self {
            id: QueryId::new(id)?,
            resources: resources.into_iter().collect(),
        })
    }

    /// The stable operation identity.
    pub fn id(&self) -> &QueryId {
        &self.id
    }

    /// The declared set of resources this action may mutate.
    pub fn resources(&self) -> &BTreeSet<Resource> {
        &self.resources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_descriptor_requires_resources() {
        let err = QueryDescriptor::new("getArticles", []).expect_err("must reject");
        assert!(matches!(err, DescriptorError::NoDeclaredResources { .. }));
    }

    #[test]
    fn test_query_descriptor_requires_identity() {
        let err =
            QueryDescriptor::new("", [Resource::new("Article")]).expect_err("must reject");
        assert!(matches!(err, DescriptorError::EmptyOperationId));
    }

    #[test]
    fn test_query_descriptor_dedupes_resources() {
        let descriptor = QueryDescriptor::new(
            "getArticles",
            [
                Resource::new("Article"),
                Resource::new("Article"),
                Resource::new("Comment"),
            ],
        )
        .expect("valid descriptor");
        assert_eq!(descriptor.resources().len(), 2);
    }

    #[test]
    fn test_action_descriptor_allows_empty_resources() {
        let descriptor = ActionDescriptor::new("ping", []).expect("valid descriptor");
        assert!(descriptor.resources().is_empty());
    }
}
