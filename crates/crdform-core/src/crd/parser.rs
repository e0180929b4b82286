//! CRD YAML parser
//!
//! Parses CustomResourceDefinition manifests into a structured `CrdSchema`
//! that the schema mirror can walk.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use super::schema::{
    AdditionalProperties, CrdNames, CrdSchema, CrdScope, CrdVersionSchema, OpenApiSchema,
    PropertyType, SchemaProperty,
};
use crate::error::{CoreError, Result};

/// Parser for CRD YAML manifests
pub struct CrdParser;

impl CrdParser {
    /// Parse a single CRD YAML document
    pub fn parse(yaml: &str) -> Result<CrdSchema> {
        let value: Value = serde_yaml::from_str(yaml).map_err(|e| CoreError::InvalidSchema {
            message: format!("Invalid CRD YAML: {}", e),
        })?;

        Self::parse_value(&value)
    }

    /// Parse every CRD of a multi-document YAML stream, skipping empty documents
    pub fn parse_all(yaml: &str) -> Result<Vec<CrdSchema>> {
        let mut crds = Vec::new();

        for (index, document) in serde_yaml::Deserializer::from_str(yaml).enumerate() {
            let value = Value::deserialize(document).map_err(|e| CoreError::InvalidSchema {
                message: format!("Invalid CRD YAML in document {}: {}", index, e),
            })?;

            if !value.is_null() {
                crds.push(Self::parse_value(&value)?);
            }
        }

        Ok(crds)
    }

    pub fn parse_value(value: &Value) -> Result<CrdSchema> {
        let kind = required_str(value, "kind", "kind")?;
        if kind != "CustomResourceDefinition" {
            return Err(invalid(format!(
                "Expected CustomResourceDefinition, got {}",
                kind
            )));
        }

        let name = value
            .get("metadata")
            .and_then(|m| str_field(m, "name"))
            .ok_or_else(|| invalid("Missing 'metadata.name' field"))?;
        let spec = value
            .get("spec")
            .ok_or_else(|| invalid("Missing 'spec' field"))?;

        let scope = match str_field(spec, "scope").as_deref() {
            Some("Cluster") => CrdScope::Cluster,
            _ => CrdScope::Namespaced,
        };

        let names = spec
            .get("names")
            .ok_or_else(|| invalid("Missing 'spec.names' field"))?;
        let names = CrdNames {
            kind: required_str(names, "kind", "spec.names.kind")?,
            plural: required_str(names, "plural", "spec.names.plural")?,
        };

        let versions = spec
            .get("versions")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid("Missing 'spec.versions' array"))?
            .iter()
            .map(Self::parse_version)
            .collect::<Result<Vec<_>>>()?;

        Ok(CrdSchema {
            name,
            group: required_str(spec, "group", "spec.group")?,
            scope,
            names,
            versions,
        })
    }

    fn parse_version(version: &Value) -> Result<CrdVersionSchema> {
        let schema = version
            .get("schema")
            .and_then(|s| s.get("openAPIV3Schema"))
            .map(|root| OpenApiSchema {
                properties: Self::parse_properties(root.get("properties")).unwrap_or_default(),
                required: string_list(root.get("required")),
                description: str_field(root, "description"),
            });

        Ok(CrdVersionSchema {
            name: required_str(version, "name", "spec.versions[].name")?,
            served: version
                .get("served")
                .and_then(Value::as_bool)
                .unwrap_or(true),
            deprecated: flag(version, "deprecated"),
            deprecation_warning: str_field(version, "deprecationWarning"),
            schema,
        })
    }

    fn parse_properties(value: Option<&Value>) -> Option<BTreeMap<String, SchemaProperty>> {
        value.and_then(Value::as_object).map(|obj| {
            obj.iter()
                .map(|(k, v)| (k.clone(), Self::parse_property(v)))
                .collect()
        })
    }

    fn parse_property(prop: &Value) -> SchemaProperty {
        let (minimum, exclusive_minimum) = bound(prop, "minimum", "exclusiveMinimum");
        let (maximum, exclusive_maximum) = bound(prop, "maximum", "exclusiveMaximum");
        let count = |key: &str| prop.get(key).and_then(Value::as_u64);

        let additional_properties = prop.get("additionalProperties").map(|v| match v {
            Value::Bool(true) => AdditionalProperties::Allowed,
            Value::Bool(false) => AdditionalProperties::Denied,
            other => AdditionalProperties::Schema(Box::new(Self::parse_property(other))),
        });

        SchemaProperty {
            type_: str_field(prop, "type")
                .map(|t| PropertyType::parse(&t))
                .unwrap_or_default(),
            description: str_field(prop, "description"),
            default: prop.get("default").cloned(),
            pattern: str_field(prop, "pattern"),
            enum_values: prop.get("enum").and_then(Value::as_array).cloned(),
            minimum,
            maximum,
            exclusive_minimum,
            exclusive_maximum,
            min_length: count("minLength"),
            max_length: count("maxLength"),
            min_items: count("minItems"),
            max_items: count("maxItems"),
            unique_items: flag(prop, "uniqueItems"),
            properties: Self::parse_properties(prop.get("properties")),
            required: prop
                .get("required")
                .filter(|r| r.is_array())
                .map(|r| string_list(Some(r))),
            items: prop
                .get("items")
                .map(|v| Box::new(Self::parse_property(v))),
            additional_properties,
            x_int_or_string: flag(prop, "x-kubernetes-int-or-string"),
            x_list_type: str_field(prop, "x-kubernetes-list-type"),
            x_list_map_keys: string_list(prop.get("x-kubernetes-list-map-keys")),
        }
    }
}

/// A numeric bound and whether it is exclusive
///
/// OpenAPI 3.0 marks exclusivity with a boolean next to the bound; JSON
/// Schema 2019+ puts the bound itself in the exclusive keyword.
fn bound(prop: &Value, key: &str, exclusive_key: &str) -> (Option<f64>, bool) {
    match prop.get(exclusive_key) {
        Some(Value::Number(n)) => (n.as_f64(), true),
        Some(Value::Bool(b)) => (prop.get(key).and_then(Value::as_f64), *b),
        _ => (prop.get(key).and_then(Value::as_f64), false),
    }
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(String::from)
}

fn required_str(value: &Value, key: &str, path: &str) -> Result<String> {
    str_field(value, key).ok_or_else(|| invalid(format!("Missing '{}' field", path)))
}

fn flag(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::InvalidSchema {
        message: message.into(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: meshtimeouts.kuma.io
spec:
  group: kuma.io
  scope: Namespaced
  names:
    kind: MeshTimeout
    plural: meshtimeouts
    singular: meshtimeout
    shortNames:
      - mt
  versions:
    - name: v1alpha1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              properties:
                targetRef:
                  type: object
                  required:
                    - kind
                  properties:
                    kind:
                      type: string
                      enum:
                        - Mesh
                        - MeshService
                    name:
                      type: string
                      maxLength: 253
                to:
                  type: array
                  items:
                    type: object
                    properties:
                      default:
                        type: object
                        properties:
                          idleTimeout:
                            type: string
                            pattern: "^[0-9]+(ms|s|m|h)$"
                          maxStreamDuration:
                            type: integer
                            minimum: 0
                            exclusiveMinimum: true
    - name: v1beta1
      served: false
      storage: false
      deprecated: true
      deprecationWarning: "kuma.io/v1beta1 MeshTimeout is deprecated"
"#;

    #[test]
    fn test_parse_crd() {
        let schema = CrdParser::parse(SAMPLE_CRD).unwrap();

        assert_eq!(schema.name, "meshtimeouts.kuma.io");
        assert_eq!(schema.group, "kuma.io");
        assert_eq!(schema.scope, CrdScope::Namespaced);
        assert_eq!(schema.names.kind, "MeshTimeout");
        assert_eq!(schema.names.plural, "meshtimeouts");
        assert_eq!(schema.versions.len(), 2);
    }

    #[test]
    fn test_parse_versions() {
        let schema = CrdParser::parse(SAMPLE_CRD).unwrap();

        let v1alpha1 = &schema.versions[0];
        assert!(v1alpha1.served);
        assert!(!v1alpha1.deprecated);
        assert!(v1alpha1.schema.is_some());

        let v1beta1 = &schema.versions[1];
        assert!(!v1beta1.served);
        assert!(v1beta1.deprecated);
        assert!(v1beta1.schema.is_none());
        assert_eq!(
            v1beta1.deprecation_warning.as_deref(),
            Some("kuma.io/v1beta1 MeshTimeout is deprecated")
        );
    }

    #[test]
    fn test_parse_schema_properties() {
        let schema = CrdParser::parse(SAMPLE_CRD).unwrap();
        let spec = schema.versions[0].spec_schema().unwrap();

        let target_kind = spec.lookup("targetRef.kind").unwrap();
        assert_eq!(target_kind.enum_values.as_ref().unwrap().len(), 2);
        assert!(spec.lookup("targetRef").unwrap().is_required("kind"));

        let name = spec.lookup("targetRef.name").unwrap();
        assert_eq!(name.max_length, Some(253));

        let to = spec.lookup("to").unwrap();
        assert_eq!(to.type_, PropertyType::Array);
        let item = to.items.as_ref().unwrap();
        let idle = item.lookup("default.idleTimeout").unwrap();
        assert_eq!(idle.pattern.as_deref(), Some("^[0-9]+(ms|s|m|h)$"));

        let max_stream = item.lookup("default.maxStreamDuration").unwrap();
        assert_eq!(max_stream.minimum, Some(0.0));
        assert!(max_stream.exclusive_minimum);
    }

    #[test]
    fn test_parse_list_map_extensions() {
        let yaml = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: things.example.com
spec:
  group: example.com
  names:
    kind: Thing
    plural: things
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          properties:
            spec:
              type: object
              properties:
                headers:
                  type: array
                  x-kubernetes-list-type: map
                  x-kubernetes-list-map-keys:
                    - name
                  items:
                    type: object
                port:
                  x-kubernetes-int-or-string: true
"#;
        let schema = CrdParser::parse(yaml).unwrap();
        let spec = schema.versions[0].spec_schema().unwrap();

        let headers = spec.lookup("headers").unwrap();
        assert_eq!(headers.x_list_type.as_deref(), Some("map"));
        assert_eq!(headers.x_list_map_keys, vec!["name"]);
        assert!(spec.lookup("port").unwrap().x_int_or_string);
    }

    #[test]
    fn test_parse_invalid_kind() {
        let yaml = r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: test
"#;
        let result = CrdParser::parse(yaml);
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Expected CustomResourceDefinition")
        );
    }

    #[test]
    fn test_parse_missing_plural() {
        let yaml = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: things.example.com
spec:
  group: example.com
  names:
    kind: Thing
  versions: []
"#;
        let err = CrdParser::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("spec.names.plural"));
    }

    #[test]
    fn test_parse_all_multi_document() {
        let yaml = format!(
            "{}\n---\n{}",
            SAMPLE_CRD,
            SAMPLE_CRD.replace("meshtimeouts", "othertimeouts")
        );
        let crds = CrdParser::parse_all(&yaml).unwrap();
        assert_eq!(crds.len(), 2);
        assert_eq!(crds[1].name, "othertimeouts.kuma.io");
    }

    #[test]
    fn test_parse_cluster_scope() {
        let yaml = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: meshes.kuma.io
spec:
  group: kuma.io
  scope: Cluster
  names:
    kind: Mesh
    plural: meshes
  versions:
    - name: v1alpha1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
"#;
        let schema = CrdParser::parse(yaml).unwrap();
        assert_eq!(schema.scope, CrdScope::Cluster);
    }
}
