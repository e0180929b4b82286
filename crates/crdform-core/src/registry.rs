//! Descriptor registry
//!
//! The registry is the descriptor table: every served version of every
//! known CRD, exposed once per mode. All schemas are mirrored up front so
//! that a malformed CRD fails at load time rather than during an operation.

use std::collections::BTreeMap;
use std::path::Path;

use crate::crd::{CrdParser, CrdSchema};
use crate::descriptor::{ResourceDescriptor, ResourceMode};
use crate::error::{CoreError, Result};
use crate::mirror::SchemaMirror;
use crate::schema::ResourceSchema;

/// CRDs shipped with the crate
const BUNDLED_CRDS: &str = include_str!("../crds/kuma.yaml");

/// Mirrored schemas keyed by mode and type name
#[derive(Debug, Clone, Default)]
pub struct Registry {
    schemas: BTreeMap<(ResourceMode, String), ResourceSchema>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry of the bundled Kuma CRDs
    pub fn bundled() -> Result<Self> {
        Self::from_crd_yaml(BUNDLED_CRDS)
    }

    /// Build from a (multi-document) CRD YAML stream
    pub fn from_crd_yaml(yaml: &str) -> Result<Self> {
        let mut registry = Self::new();
        registry.add_crd_yaml(yaml)?;
        Ok(registry)
    }

    /// Add CRDs from a YAML stream
    pub fn add_crd_yaml(&mut self, yaml: &str) -> Result<()> {
        for crd in CrdParser::parse_all(yaml)? {
            self.add_crd(&crd)?;
        }
        Ok(())
    }

    /// Add CRDs from a file
    pub fn add_crd_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let content = std::fs::read_to_string(path)?;
        self.add_crd_yaml(&content)
    }

    /// Register every served version of a CRD in every mode
    pub fn add_crd(&mut self, crd: &CrdSchema) -> Result<()> {
        for version in crd.served_versions() {
            if version.schema.is_none() {
                tracing::warn!(
                    crd = %crd.name,
                    version = %version.name,
                    "served version has no schema, skipping"
                );
                continue;
            }

            for mode in ResourceMode::ALL {
                let descriptor = ResourceDescriptor::new(
                    crd.group.clone(),
                    version.name.clone(),
                    crd.names.kind.clone(),
                    crd.names.plural.clone(),
                    crd.scope,
                    mode,
                )?;
                let schema = SchemaMirror::build(&descriptor, version)?;
                self.insert(schema)?;
            }
        }
        Ok(())
    }

    /// Insert a mirrored schema, rejecting duplicate type names per mode
    pub fn insert(&mut self, schema: ResourceSchema) -> Result<()> {
        let key = (schema.descriptor.mode, schema.type_name());
        if self.schemas.contains_key(&key) {
            return Err(CoreError::DuplicateType { type_name: key.1 });
        }
        tracing::debug!(type_name = %key.1, mode = %key.0, "registered type");
        self.schemas.insert(key, schema);
        Ok(())
    }

    pub fn get(&self, mode: ResourceMode, type_name: &str) -> Option<&ResourceSchema> {
        self.schemas.get(&(mode, type_name.to_string()))
    }

    /// Schemas of one mode, ordered by type name
    pub fn types(&self, mode: ResourceMode) -> impl Iterator<Item = &ResourceSchema> {
        self.schemas
            .iter()
            .filter(move |((m, _), _)| *m == mode)
            .map(|(_, schema)| schema)
    }

    /// Type names of one mode
    pub fn type_names(&self, mode: ResourceMode) -> Vec<String> {
        self.types(mode).map(ResourceSchema::type_name).collect()
    }

    /// All schemas, ordered by mode then type name
    pub fn iter(&self) -> impl Iterator<Item = &ResourceSchema> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::CrdScope;
    use crate::schema::{AttributeType, Presence};

    #[test]
    fn test_bundled_types() {
        let registry = Registry::bundled().unwrap();

        assert_eq!(
            registry.type_names(ResourceMode::Resource),
            vec![
                "kuma_io_mesh_health_check_v1alpha1",
                "kuma_io_mesh_proxy_patch_v1alpha1",
                "kuma_io_mesh_retry_v1alpha1",
                "kuma_io_mesh_timeout_v1alpha1",
                "kuma_io_mesh_traffic_permission_v1alpha1",
                "kuma_io_mesh_v1alpha1",
            ]
        );
        assert_eq!(registry.len(), 18);
        assert!(
            registry
                .get(ResourceMode::Manifest, "kuma_io_mesh_retry_v1alpha1_manifest")
                .is_some()
        );
        assert!(
            registry
                .get(ResourceMode::DataSource, "kuma_io_mesh_retry_v1alpha1")
                .is_some()
        );
    }

    #[test]
    fn test_unserved_version_skipped() {
        let registry = Registry::bundled().unwrap();
        assert!(
            registry
                .get(ResourceMode::Resource, "kuma_io_mesh_timeout_v1beta1")
                .is_none()
        );
    }

    #[test]
    fn test_cluster_scoped_mesh() {
        let registry = Registry::bundled().unwrap();
        let mesh = registry
            .get(ResourceMode::Resource, "kuma_io_mesh_v1alpha1")
            .unwrap();
        assert_eq!(mesh.descriptor.scope, CrdScope::Cluster);
        assert!(mesh.attribute_path("metadata.namespace").is_none());
    }

    #[test]
    fn test_proxy_patch_operation_enum() {
        let registry = Registry::bundled().unwrap();
        let schema = registry
            .get(ResourceMode::Resource, "kuma_io_mesh_proxy_patch_v1alpha1")
            .unwrap();
        let operation = schema
            .attribute_path("spec.default.append_modifications.cluster.operation")
            .unwrap();
        assert_eq!(operation.presence, Presence::Required);
        assert_eq!(operation.attr_type, AttributeType::String);
        assert_eq!(operation.validators.len(), 1);
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let mut registry = Registry::bundled().unwrap();
        let err = registry.add_crd_yaml(BUNDLED_CRDS).unwrap_err();
        assert!(matches!(err, CoreError::DuplicateType { .. }));
    }

    #[test]
    fn test_invalid_crd_fails_at_load() {
        let err = Registry::from_crd_yaml("apiVersion: v1\nkind: ConfigMap\n").unwrap_err();
        assert!(matches!(err, CoreError::InvalidSchema { .. }));
    }

    #[test]
    fn test_schema_description() {
        let registry = Registry::bundled().unwrap();
        let schema = registry
            .get(ResourceMode::Resource, "kuma_io_mesh_traffic_permission_v1alpha1")
            .unwrap();
        let described = schema.describe();

        assert_eq!(described["api_version"], "kuma.io/v1alpha1");
        assert_eq!(described["mode"], "resource");
        assert_eq!(described["scope"], "Namespaced");

        let from = &described["attributes"]["spec"]["attributes"]["from"];
        assert_eq!(from["type"], "list(object)");
        assert_eq!(from["validators"][0]["item_count"]["min"], 1);

        let action = &from["attributes"]["default"]["attributes"]["action"];
        assert_eq!(action["presence"], "optional");
        assert_eq!(
            action["validators"][0]["one_of"],
            serde_json::json!(["Allow", "Deny", "AllowWithShadowDeny"])
        );
    }
}
