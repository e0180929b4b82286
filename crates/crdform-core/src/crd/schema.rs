//! Structural representation of a CustomResourceDefinition
//!
//! Only the parts of a CRD that drive attribute mirroring are kept: naming,
//! scope, served versions and the OpenAPI v3 tree of each version.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A parsed CustomResourceDefinition
#[derive(Debug, Clone, PartialEq)]
pub struct CrdSchema {
    /// Full CRD name (e.g., "meshretries.kuma.io")
    pub name: String,
    pub group: String,
    pub scope: CrdScope,
    pub names: CrdNames,
    pub versions: Vec<CrdVersionSchema>,
}

impl CrdSchema {
    /// Versions the API server accepts requests for
    pub fn served_versions(&self) -> impl Iterator<Item = &CrdVersionSchema> {
        self.versions.iter().filter(|v| v.served)
    }
}

/// Whether objects live in a namespace or at cluster level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum CrdScope {
    #[default]
    Namespaced,
    Cluster,
}

impl std::fmt::Display for CrdScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Namespaced => write!(f, "Namespaced"),
            Self::Cluster => write!(f, "Cluster"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CrdNames {
    /// Kind (e.g., "MeshRetry")
    pub kind: String,
    /// Plural used in API paths (e.g., "meshretries")
    pub plural: String,
}

/// A single API version of a CRD
#[derive(Debug, Clone, PartialEq)]
pub struct CrdVersionSchema {
    /// Version name (e.g., "v1alpha1")
    pub name: String,
    pub served: bool,
    pub deprecated: bool,
    pub deprecation_warning: Option<String>,
    /// `schema.openAPIV3Schema`, absent for schemaless versions
    pub schema: Option<OpenApiSchema>,
}

impl CrdVersionSchema {
    pub fn spec_schema(&self) -> Option<&SchemaProperty> {
        self.schema.as_ref().and_then(|s| s.properties.get("spec"))
    }

    /// Whether the root schema lists `spec` as required
    pub fn spec_required(&self) -> bool {
        self.schema
            .as_ref()
            .is_some_and(|s| s.required.iter().any(|r| r == "spec"))
    }
}

/// Root of a version's OpenAPI v3 schema
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OpenApiSchema {
    /// Usually apiVersion, kind, metadata, spec and status
    pub properties: BTreeMap<String, SchemaProperty>,
    pub required: Vec<String>,
    pub description: Option<String>,
}

/// One node of the OpenAPI tree
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SchemaProperty {
    pub type_: PropertyType,
    pub description: Option<String>,
    pub default: Option<Value>,
    pub pattern: Option<String>,
    /// Allowed values (`enum`)
    pub enum_values: Option<Vec<Value>>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub exclusive_minimum: bool,
    pub exclusive_maximum: bool,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
    pub unique_items: bool,
    pub properties: Option<BTreeMap<String, SchemaProperty>>,
    pub required: Option<Vec<String>>,
    pub items: Option<Box<SchemaProperty>>,
    pub additional_properties: Option<AdditionalProperties>,
    /// x-kubernetes-int-or-string
    pub x_int_or_string: bool,
    /// x-kubernetes-list-type (atomic, set, map)
    pub x_list_type: Option<String>,
    /// x-kubernetes-list-map-keys
    pub x_list_map_keys: Vec<String>,
}

impl SchemaProperty {
    /// Follow a dot-separated path of property names
    pub fn lookup(&self, path: &str) -> Option<&SchemaProperty> {
        path.split('.')
            .try_fold(self, |node, key| node.properties.as_ref()?.get(key))
    }

    pub fn is_required(&self, name: &str) -> bool {
        self.required
            .as_ref()
            .is_some_and(|r| r.iter().any(|n| n == name))
    }
}

/// OpenAPI `type`; a missing type reads as object
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PropertyType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    #[default]
    Object,
    Unknown(String),
}

impl PropertyType {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "string" => Self::String,
            "integer" => Self::Integer,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "array" => Self::Array,
            "object" => Self::Object,
            other => Self::Unknown(other.to_string()),
        }
    }
}

/// `additionalProperties` of an object
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AdditionalProperties {
    #[default]
    Allowed,
    Denied,
    /// Values must match this schema (map types)
    Schema(Box<SchemaProperty>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(type_: PropertyType) -> SchemaProperty {
        SchemaProperty {
            type_,
            ..Default::default()
        }
    }

    #[test]
    fn test_lookup_and_required() {
        let http = SchemaProperty {
            properties: Some(BTreeMap::from([
                ("numRetry".to_string(), leaf(PropertyType::Integer)),
                ("backOff".to_string(), leaf(PropertyType::String)),
            ])),
            required: Some(vec!["numRetry".to_string()]),
            ..Default::default()
        };
        let spec = SchemaProperty {
            properties: Some(BTreeMap::from([("http".to_string(), http)])),
            ..Default::default()
        };

        assert_eq!(
            spec.lookup("http.numRetry").map(|p| &p.type_),
            Some(&PropertyType::Integer)
        );
        assert!(spec.lookup("http.missing").is_none());
        assert!(spec.lookup("http").unwrap().is_required("numRetry"));
        assert!(!spec.lookup("http").unwrap().is_required("backOff"));
    }

    #[test]
    fn test_property_type_parse() {
        assert_eq!(PropertyType::parse("String"), PropertyType::String);
        assert_eq!(PropertyType::parse("integer"), PropertyType::Integer);
        assert_eq!(
            PropertyType::parse("custom"),
            PropertyType::Unknown("custom".to_string())
        );
    }

    #[test]
    fn test_served_versions() {
        let version = |name: &str, served: bool| CrdVersionSchema {
            name: name.to_string(),
            served,
            deprecated: false,
            deprecation_warning: None,
            schema: None,
        };
        let crd = CrdSchema {
            name: "meshretries.kuma.io".to_string(),
            group: "kuma.io".to_string(),
            scope: CrdScope::Namespaced,
            names: CrdNames {
                kind: "MeshRetry".to_string(),
                plural: "meshretries".to_string(),
            },
            versions: vec![version("v1alpha1", true), version("v1beta1", false)],
        };

        let served: Vec<_> = crd.served_versions().map(|v| v.name.as_str()).collect();
        assert_eq!(served, vec!["v1alpha1"]);
    }
}
