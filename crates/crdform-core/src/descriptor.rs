//! Resource descriptors
//!
//! A descriptor is the static identity of one generated type: which CRD
//! version it mirrors and whether it is a mutable resource, a read-only data
//! source, or an offline manifest renderer.

use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};

use crate::crd::CrdScope;
use crate::error::{CoreError, Result};

/// How a descriptor is exposed to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceMode {
    /// Mutable resource with full CRUD
    Resource,
    /// Read-only lookup of an existing object
    DataSource,
    /// Offline rendering of the object as YAML
    Manifest,
}

impl ResourceMode {
    pub const ALL: [ResourceMode; 3] = [Self::Resource, Self::DataSource, Self::Manifest];

    /// Whether operations of this mode reach the cluster
    pub fn uses_cluster(&self) -> bool {
        !matches!(self, Self::Manifest)
    }

    pub fn is_mutable(&self) -> bool {
        matches!(self, Self::Resource)
    }
}

impl std::fmt::Display for ResourceMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Resource => write!(f, "resource"),
            Self::DataSource => write!(f, "data source"),
            Self::Manifest => write!(f, "manifest"),
        }
    }
}

/// Static metadata of one CRD version exposed in one mode
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceDescriptor {
    /// API group (empty for the core group)
    pub group: String,
    pub version: String,
    pub kind: String,
    /// Plural resource name used in API paths
    pub plural: String,
    pub scope: CrdScope,
    pub mode: ResourceMode,
}

impl ResourceDescriptor {
    /// Create a descriptor, rejecting empty names
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
        plural: impl Into<String>,
        scope: CrdScope,
        mode: ResourceMode,
    ) -> Result<Self> {
        let descriptor = Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
            plural: plural.into(),
            scope,
            mode,
        };

        for (field, value) in [
            ("version", &descriptor.version),
            ("kind", &descriptor.kind),
            ("plural", &descriptor.plural),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::InvalidDescriptor {
                    message: format!("{} must not be empty", field),
                });
            }
        }

        if descriptor.plural.contains('/') || descriptor.group.contains('/') {
            return Err(CoreError::InvalidDescriptor {
                message: format!(
                    "group '{}' and plural '{}' must not contain '/'",
                    descriptor.group, descriptor.plural
                ),
            });
        }

        Ok(descriptor)
    }

    /// Same CRD version exposed in another mode
    pub fn with_mode(&self, mode: ResourceMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    /// The `apiVersion` written into every object
    ///
    /// - group "kuma.io", version "v1alpha1" -> "kuma.io/v1alpha1"
    /// - core group, version "v1" -> "v1"
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn is_namespaced(&self) -> bool {
        self.scope == CrdScope::Namespaced
    }

    /// Host-facing type name, e.g. `kuma_io_mesh_retry_v1alpha1`
    ///
    /// Manifest types carry a `_manifest` suffix; data sources share the
    /// resource name.
    pub fn type_name(&self) -> String {
        let mut parts = Vec::with_capacity(4);
        if !self.group.is_empty() {
            parts.push(self.group.replace(['.', '-'], "_"));
        }
        parts.push(self.kind.to_case(Case::Snake));
        parts.push(self.version.to_lowercase());
        if self.mode == ResourceMode::Manifest {
            parts.push("manifest".to_string());
        }
        parts.join("_")
    }
}

impl std::fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.api_version(), self.kind, self.mode)
    }
}
