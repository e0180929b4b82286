//! Schema mirror: CRD OpenAPI schema -> attribute tree
//!
//! The mirror is pure. The same descriptor and CRD version always produce
//! the same `ResourceSchema`; any malformed input is reported as
//! `CoreError::InvalidSchema` when the registry is built.

use convert_case::{Case, Casing};
use regex::Regex;
use std::collections::HashSet;

use crate::crd::{AdditionalProperties, CrdVersionSchema, PropertyType, SchemaProperty};
use crate::descriptor::{ResourceDescriptor, ResourceMode};
use crate::error::{CoreError, Result};
use crate::schema::{AttributeSpec, AttributeType, Element, Presence, ResourceSchema, Validator};

/// DNS subdomain (RFC 1123), used for object names
const NAME_PATTERN: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$";
/// DNS label (RFC 1123), used for namespaces
const NAMESPACE_PATTERN: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$";

/// Builds the attribute tree of one descriptor
pub struct SchemaMirror {
    mode: ResourceMode,
}

impl SchemaMirror {
    /// Mirror a CRD version for the given descriptor
    pub fn build(descriptor: &ResourceDescriptor, version: &CrdVersionSchema) -> Result<ResourceSchema> {
        if version.name != descriptor.version {
            return Err(CoreError::InvalidSchema {
                message: format!(
                    "descriptor version '{}' does not match CRD version '{}'",
                    descriptor.version, version.name
                ),
            });
        }

        let mirror = Self {
            mode: descriptor.mode,
        };

        let mut attributes = mirror.bookkeeping();
        attributes.push(mirror.metadata(descriptor)?);

        if let Some(spec) = version.spec_schema() {
            attributes.push(mirror.property("spec", spec, version.spec_required(), "spec")?);
        }

        let deprecation = version.deprecation_warning.clone().or_else(|| {
            version.deprecated.then(|| {
                format!(
                    "{} {} is deprecated",
                    descriptor.api_version(),
                    descriptor.kind
                )
            })
        });

        tracing::debug!(
            type_name = %descriptor.type_name(),
            mode = %descriptor.mode,
            attributes = attributes.len(),
            "mirrored CRD schema"
        );

        Ok(ResourceSchema {
            descriptor: descriptor.clone(),
            attributes,
            description: version.schema.as_ref().and_then(|s| s.description.clone()),
            deprecation,
        })
    }

    /// Provider-owned top-level attributes
    fn bookkeeping(&self) -> Vec<AttributeSpec> {
        let knob = if self.mode == ResourceMode::DataSource {
            Presence::Computed
        } else {
            Presence::OptionalComputed
        };

        let mut attributes = vec![
            AttributeSpec::new("id", "id", AttributeType::String, knob)
                .with_description("Identity of the object: '<namespace>/<name>' or '<name>'."),
        ];

        if self.mode == ResourceMode::Resource {
            attributes.extend([
                AttributeSpec::new(
                    "force_conflicts",
                    "force_conflicts",
                    AttributeType::Bool,
                    Presence::OptionalComputed,
                )
                .with_description("Take ownership of fields managed by other field managers."),
                AttributeSpec::new(
                    "field_manager",
                    "field_manager",
                    AttributeType::String,
                    Presence::OptionalComputed,
                )
                .with_description("Field manager name used for server-side apply."),
                AttributeSpec::new(
                    "wait_for",
                    "wait_for",
                    AttributeType::map(Element::string()),
                    Presence::OptionalComputed,
                )
                .with_description("Field paths and the values they must reach after apply."),
            ]);
        }

        if self.mode == ResourceMode::Manifest {
            attributes.push(
                AttributeSpec::new("yaml", "yaml", AttributeType::String, Presence::Computed)
                    .with_description("The rendered manifest."),
            );
        }

        attributes.extend([
            AttributeSpec::new("api_version", "apiVersion", AttributeType::String, Presence::Computed),
            AttributeSpec::new("kind", "kind", AttributeType::String, Presence::Computed),
        ]);

        attributes
    }

    fn metadata(&self, descriptor: &ResourceDescriptor) -> Result<AttributeSpec> {
        let tags = if self.mode == ResourceMode::DataSource {
            Presence::Computed
        } else {
            Presence::Optional
        };

        let mut children = vec![
            AttributeSpec::new("name", "name", AttributeType::String, Presence::Required)
                .with_description("Unique name of the object.")
                .with_validator(Validator::Length {
                    min: Some(1),
                    max: Some(253),
                })
                .with_validator(Validator::Pattern(compile(NAME_PATTERN)?)),
        ];

        if descriptor.is_namespaced() {
            children.push(
                AttributeSpec::new("namespace", "namespace", AttributeType::String, Presence::Required)
                    .with_description("Namespace of the object.")
                    .with_validator(Validator::Length {
                        min: Some(1),
                        max: Some(63),
                    })
                    .with_validator(Validator::Pattern(compile(NAMESPACE_PATTERN)?)),
            );
        }

        children.extend([
            AttributeSpec::new("labels", "labels", AttributeType::map(Element::string()), tags)
                .with_description("Labels attached to the object."),
            AttributeSpec::new(
                "annotations",
                "annotations",
                AttributeType::map(Element::string()),
                tags,
            )
            .with_description("Annotations attached to the object."),
        ]);

        Ok(
            AttributeSpec::new(
                "metadata",
                "metadata",
                AttributeType::Object(children),
                Presence::Required,
            )
            .with_description("Standard object metadata."),
        )
    }

    fn presence(&self, required: bool, prop: &SchemaProperty) -> Presence {
        match self.mode {
            ResourceMode::DataSource => Presence::Computed,
            _ if required && prop.default.is_none() => Presence::Required,
            _ => Presence::Optional,
        }
    }

    /// Mirror one named property
    fn property(
        &self,
        wire_name: &str,
        prop: &SchemaProperty,
        required: bool,
        path: &str,
    ) -> Result<AttributeSpec> {
        let mut attribute = AttributeSpec::new(
            wire_name.to_case(Case::Snake),
            wire_name,
            self.attr_type(prop, path)?,
            self.presence(required, prop),
        );
        attribute.description = prop.description.clone();
        attribute.default = prop.default.clone();
        attribute.validators = validators(prop, path);
        Ok(attribute)
    }

    fn element(&self, prop: &SchemaProperty, path: &str) -> Result<Element> {
        Ok(Element {
            attr_type: self.attr_type(prop, path)?,
            validators: validators(prop, path),
        })
    }

    fn attr_type(&self, prop: &SchemaProperty, path: &str) -> Result<AttributeType> {
        if prop.x_int_or_string {
            return Ok(AttributeType::Dynamic);
        }

        let attr_type = match &prop.type_ {
            PropertyType::String => AttributeType::String,
            PropertyType::Integer => AttributeType::Int64,
            PropertyType::Number => AttributeType::Float64,
            PropertyType::Boolean => AttributeType::Bool,
            PropertyType::Array => match &prop.items {
                Some(items) => AttributeType::list(self.element(items, &format!("{}[]", path))?),
                None => AttributeType::list(Element::new(AttributeType::Dynamic)),
            },
            PropertyType::Object => {
                if let Some(properties) = prop.properties.as_ref().filter(|p| !p.is_empty()) {
                    let mut children = Vec::with_capacity(properties.len());
                    let mut seen = HashSet::new();
                    for (key, child) in properties {
                        let child_path = format!("{}.{}", path, key);
                        let attribute =
                            self.property(key, child, prop.is_required(key), &child_path)?;
                        if !seen.insert(attribute.name.clone()) {
                            return Err(CoreError::InvalidSchema {
                                message: format!(
                                    "properties of '{}' collide on attribute name '{}'",
                                    path, attribute.name
                                ),
                            });
                        }
                        children.push(attribute);
                    }
                    AttributeType::Object(children)
                } else if let Some(AdditionalProperties::Schema(values)) =
                    &prop.additional_properties
                {
                    AttributeType::map(self.element(values, &format!("{}{{}}", path))?)
                } else {
                    AttributeType::Dynamic
                }
            }
            PropertyType::Unknown(other) => {
                tracing::debug!(path, type_ = %other, "unknown property type, using dynamic");
                AttributeType::Dynamic
            }
        };

        Ok(attr_type)
    }
}

/// Value constraints of one property
fn validators(prop: &SchemaProperty, path: &str) -> Vec<Validator> {
    let mut validators = Vec::new();

    if let Some(values) = prop.enum_values.as_ref().filter(|v| !v.is_empty()) {
        validators.push(Validator::OneOf(values.clone()));
    }

    if prop.minimum.is_some() || prop.maximum.is_some() {
        validators.push(Validator::Range {
            min: prop.minimum,
            max: prop.maximum,
            exclusive_min: prop.exclusive_minimum,
            exclusive_max: prop.exclusive_maximum,
        });
    }

    if let Some(pattern) = &prop.pattern {
        match Regex::new(pattern) {
            Ok(regex) => validators.push(Validator::Pattern(regex)),
            Err(e) => {
                tracing::warn!(path, pattern = %pattern, error = %e, "skipping unsupported pattern")
            }
        }
    }

    if prop.min_length.is_some() || prop.max_length.is_some() {
        validators.push(Validator::Length {
            min: prop.min_length,
            max: prop.max_length,
        });
    }

    if prop.min_items.is_some() || prop.max_items.is_some() {
        validators.push(Validator::ItemCount {
            min: prop.min_items,
            max: prop.max_items,
        });
    }

    match prop.x_list_type.as_deref() {
        Some("map") if !prop.x_list_map_keys.is_empty() => {
            validators.push(Validator::UniqueKeys(
                prop.x_list_map_keys
                    .iter()
                    .map(|k| k.to_case(Case::Snake))
                    .collect(),
            ));
        }
        Some("set") => validators.push(Validator::UniqueItems),
        _ if prop.unique_items => validators.push(Validator::UniqueItems),
        _ => {}
    }

    validators
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| CoreError::InvalidSchema {
        message: format!("invalid pattern '{}': {}", pattern, e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{CrdParser, CrdScope};
    use serde_json::json;

    const CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: meshproxypatches.kuma.io
spec:
  group: kuma.io
  scope: Namespaced
  names:
    kind: MeshProxyPatch
    plural: meshproxypatches
  versions:
    - name: v1alpha1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          required:
            - spec
          properties:
            spec:
              type: object
              required:
                - targetRef
                - default
              properties:
                targetRef:
                  type: object
                  required:
                    - kind
                  properties:
                    kind:
                      type: string
                      enum: [Mesh, MeshService]
                    tags:
                      type: object
                      additionalProperties:
                        type: string
                default:
                  type: object
                  properties:
                    appendModifications:
                      type: array
                      maxItems: 10
                      items:
                        type: object
                        required:
                          - operation
                        properties:
                          operation:
                            type: string
                            enum: [Add, Remove, Patch]
                          priority:
                            type: integer
                            default: 0
                            minimum: 0
                          port:
                            x-kubernetes-int-or-string: true
                          value:
                            type: object
                            x-kubernetes-preserve-unknown-fields: true
                    listeners:
                      type: array
                      x-kubernetes-list-type: map
                      x-kubernetes-list-map-keys: [name]
                      items:
                        type: object
                        properties:
                          name:
                            type: string
                    backOff:
                      type: string
                      pattern: "^(?=.*s)[0-9]+s$"
"#;

    fn mirror(mode: ResourceMode) -> ResourceSchema {
        let crd = CrdParser::parse(CRD).unwrap();
        let descriptor = ResourceDescriptor::new(
            crd.group.clone(),
            "v1alpha1",
            crd.names.kind.clone(),
            crd.names.plural.clone(),
            crd.scope,
            mode,
        )
        .unwrap();
        SchemaMirror::build(&descriptor, &crd.versions[0]).unwrap()
    }

    fn names(schema: &ResourceSchema) -> Vec<&str> {
        schema.attributes.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_resource_top_level() {
        let schema = mirror(ResourceMode::Resource);
        assert_eq!(
            names(&schema),
            vec![
                "id",
                "force_conflicts",
                "field_manager",
                "wait_for",
                "api_version",
                "kind",
                "metadata",
                "spec"
            ]
        );
        for knob in ["id", "force_conflicts", "field_manager", "wait_for"] {
            assert_eq!(
                schema.attribute(knob).unwrap().presence,
                Presence::OptionalComputed
            );
        }
        assert_eq!(schema.attribute("api_version").unwrap().wire_name, "apiVersion");
        assert_eq!(schema.attribute("spec").unwrap().presence, Presence::Required);
    }

    #[test]
    fn test_metadata_policy() {
        let schema = mirror(ResourceMode::Resource);
        assert_eq!(
            schema.attribute_path("metadata.name").unwrap().presence,
            Presence::Required
        );
        assert_eq!(
            schema.attribute_path("metadata.namespace").unwrap().presence,
            Presence::Required
        );
        assert_eq!(
            schema.attribute_path("metadata.labels").unwrap().presence,
            Presence::Optional
        );
    }

    #[test]
    fn test_nested_naming_and_presence() {
        let schema = mirror(ResourceMode::Resource);
        let target_ref = schema.attribute_path("spec.target_ref").unwrap();
        assert_eq!(target_ref.wire_name, "targetRef");
        assert_eq!(target_ref.presence, Presence::Required);

        let kind = schema.attribute_path("spec.target_ref.kind").unwrap();
        assert_eq!(kind.presence, Presence::Required);
        assert_eq!(
            kind.validators,
            vec![Validator::OneOf(vec![json!("Mesh"), json!("MeshService")])]
        );

        // required with a default becomes optional
        let priority = schema
            .attribute_path("spec.default.append_modifications.priority")
            .unwrap();
        assert_eq!(priority.presence, Presence::Optional);
        assert_eq!(priority.default, Some(json!(0)));
    }

    #[test]
    fn test_type_mapping() {
        let schema = mirror(ResourceMode::Resource);
        let attr = |p: &str| schema.attribute_path(p).unwrap().attr_type.clone();

        assert_eq!(attr("spec.target_ref.tags"), AttributeType::map(Element::string()));
        assert_eq!(
            attr("spec.default.append_modifications.port"),
            AttributeType::Dynamic
        );
        assert_eq!(
            attr("spec.default.append_modifications.value"),
            AttributeType::Dynamic
        );
        assert_eq!(
            attr("spec.default.append_modifications").label(),
            "list(object)"
        );
    }

    #[test]
    fn test_list_validators() {
        let schema = mirror(ResourceMode::Resource);
        let modifications = schema
            .attribute_path("spec.default.append_modifications")
            .unwrap();
        assert_eq!(
            modifications.validators,
            vec![Validator::ItemCount {
                min: None,
                max: Some(10)
            }]
        );

        let listeners = schema.attribute_path("spec.default.listeners").unwrap();
        assert_eq!(
            listeners.validators,
            vec![Validator::UniqueKeys(vec!["name".to_string()])]
        );
    }

    #[test]
    fn test_unsupported_pattern_is_skipped() {
        let schema = mirror(ResourceMode::Resource);
        let back_off = schema.attribute_path("spec.default.back_off").unwrap();
        assert!(back_off.validators.is_empty());
    }

    #[test]
    fn test_data_source_mode() {
        let schema = mirror(ResourceMode::DataSource);
        assert_eq!(
            names(&schema),
            vec!["id", "api_version", "kind", "metadata", "spec"]
        );
        assert_eq!(
            schema.attribute_path("metadata.name").unwrap().presence,
            Presence::Required
        );
        assert_eq!(
            schema.attribute_path("metadata.namespace").unwrap().presence,
            Presence::Required
        );
        for path in ["id", "spec", "spec.target_ref.kind", "metadata.labels"] {
            assert_eq!(
                schema.attribute_path(path).unwrap().presence,
                Presence::Computed,
                "{}",
                path
            );
        }
    }

    #[test]
    fn test_manifest_mode() {
        let schema = mirror(ResourceMode::Manifest);
        assert_eq!(
            names(&schema),
            vec!["id", "yaml", "api_version", "kind", "metadata", "spec"]
        );
        assert_eq!(schema.attribute("yaml").unwrap().presence, Presence::Computed);
    }

    #[test]
    fn test_cluster_scope_has_no_namespace() {
        let crd = CrdParser::parse(CRD).unwrap();
        let descriptor = ResourceDescriptor::new(
            "kuma.io",
            "v1alpha1",
            "MeshProxyPatch",
            "meshproxypatches",
            CrdScope::Cluster,
            ResourceMode::Resource,
        )
        .unwrap();
        let schema = SchemaMirror::build(&descriptor, &crd.versions[0]).unwrap();
        assert!(schema.attribute_path("metadata.namespace").is_none());
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(mirror(ResourceMode::Resource), mirror(ResourceMode::Resource));
    }

    #[test]
    fn test_version_mismatch() {
        let crd = CrdParser::parse(CRD).unwrap();
        let descriptor = ResourceDescriptor::new(
            "kuma.io",
            "v2",
            "MeshProxyPatch",
            "meshproxypatches",
            CrdScope::Namespaced,
            ResourceMode::Resource,
        )
        .unwrap();
        assert!(matches!(
            SchemaMirror::build(&descriptor, &crd.versions[0]),
            Err(CoreError::InvalidSchema { .. })
        ));
    }

    #[test]
    fn test_colliding_names() {
        let crd = CrdParser::parse(
            &CRD.replace("backOff:", "back_off:\n                      type: string\n                    backOff:"),
        )
        .unwrap();
        let descriptor = ResourceDescriptor::new(
            "kuma.io",
            "v1alpha1",
            "MeshProxyPatch",
            "meshproxypatches",
            CrdScope::Namespaced,
            ResourceMode::Resource,
        )
        .unwrap();
        assert!(SchemaMirror::build(&descriptor, &crd.versions[0]).is_err());
    }
}
