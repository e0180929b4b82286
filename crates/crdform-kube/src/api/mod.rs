//! Upstream resource API
//!
//! The adapters talk to the cluster through [`ResourceApi`], an untyped
//! interface addressed by group/version/kind/plural plus namespace and name.
//! Documents stay `serde_json::Value` on both sides.
//!
//! - [`KubeResourceApi`]: server-side apply through `kube::Api<DynamicObject>`
//! - [`MockResourceApi`]: in-memory objects for tests

mod cluster;
mod mock;

pub use self::cluster::KubeResourceApi;
pub use self::mock::{MockOperation, MockResourceApi, OperationCounts};

use async_trait::async_trait;
use crdform_core::{Identity, ResourceDescriptor};
use serde_json::Value as JsonValue;

use crate::error::ApiError;

/// Address of one object on the API server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    /// `None` for cluster-scoped objects
    pub namespace: Option<String>,
    pub name: String,
}

impl ObjectRef {
    pub fn new(descriptor: &ResourceDescriptor, identity: &Identity) -> Self {
        Self {
            group: descriptor.group.clone(),
            version: descriptor.version.clone(),
            kind: descriptor.kind.clone(),
            plural: descriptor.plural.clone(),
            namespace: identity.namespace.clone(),
            name: identity.name.clone(),
        }
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(namespace) => write!(f, "{} {}/{}", self.kind, namespace, self.name),
            None => write!(f, "{} {}", self.kind, self.name),
        }
    }
}

/// Server-side apply options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyParams {
    pub field_manager: String,
    /// Take ownership of fields held by other managers
    pub force: bool,
}

/// Untyped create/read/delete against the API server
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// Server-side apply `document`, returning the object as stored
    async fn apply(
        &self,
        object: &ObjectRef,
        document: &JsonValue,
        params: &ApplyParams,
    ) -> Result<JsonValue, ApiError>;

    /// Fetch the current object
    async fn get(&self, object: &ObjectRef) -> Result<JsonValue, ApiError>;

    /// Delete the object with background propagation
    async fn delete(&self, object: &ObjectRef) -> Result<(), ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crdform_core::{CrdScope, ResourceMode};

    #[test]
    fn test_object_ref_display() {
        let descriptor = ResourceDescriptor::new(
            "kuma.io",
            "v1alpha1",
            "MeshRetry",
            "meshretries",
            CrdScope::Namespaced,
            ResourceMode::Resource,
        )
        .unwrap();
        let object = ObjectRef::new(&descriptor, &Identity::namespaced("kuma-system", "retry"));
        assert_eq!(object.to_string(), "MeshRetry kuma-system/retry");
        assert_eq!(object.api_version(), "kuma.io/v1alpha1");

        let mesh = ObjectRef {
            kind: "Mesh".to_string(),
            namespace: None,
            name: "default".to_string(),
            ..object
        };
        assert_eq!(mesh.to_string(), "Mesh default");
    }
}
