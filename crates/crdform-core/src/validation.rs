//! Configuration validation against the attribute tree
//!
//! Runs on the host-facing (snake_case) JSON form before any cluster call.

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::schema::{AttributeSpec, AttributeType, Element, Presence, ResourceSchema, Validator};
use crate::suggestions::suggest_attribute;

/// One validation failure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    /// Attribute path, e.g. `spec.default.conf[0].operation`
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Result of schema validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self {
            is_valid: true,
            errors: vec![],
        }
    }

    pub fn failure(errors: Vec<ValidationIssue>) -> Self {
        Self {
            is_valid: false,
            errors,
        }
    }

    fn from_issues(errors: Vec<ValidationIssue>) -> Self {
        if errors.is_empty() {
            Self::success()
        } else {
            Self::failure(errors)
        }
    }
}

impl ResourceSchema {
    /// Validate user configuration
    ///
    /// Computed attributes may not be set.
    pub fn validate(&self, config: &JsonValue) -> ValidationResult {
        self.run(config, false)
    }

    /// Validate a plan, which may carry computed values from prior state
    pub fn validate_plan(&self, plan: &JsonValue) -> ValidationResult {
        self.run(plan, true)
    }

    fn run(&self, value: &JsonValue, allow_computed: bool) -> ValidationResult {
        let mut checker = Checker {
            allow_computed,
            issues: Vec::new(),
        };
        match value {
            JsonValue::Object(map) => checker.object(&self.attributes, map, ""),
            other => checker.push("", format!("expected an object, got {}", kind_of(other))),
        }
        ValidationResult::from_issues(checker.issues)
    }
}

struct Checker {
    allow_computed: bool,
    issues: Vec<ValidationIssue>,
}

impl Checker {
    fn push(&mut self, path: &str, message: String) {
        self.issues.push(ValidationIssue {
            path: display_path(path),
            message,
            suggestion: None,
        });
    }

    fn object(
        &mut self,
        attributes: &[AttributeSpec],
        map: &serde_json::Map<String, JsonValue>,
        path: &str,
    ) {
        for key in map.keys() {
            if attributes.iter().all(|a| &a.name != key) {
                let names = attributes.iter().map(|a| a.name.as_str());
                self.issues.push(ValidationIssue {
                    path: display_path(&join(path, key)),
                    message: "unknown attribute".to_string(),
                    suggestion: suggest_attribute(key, names),
                });
            }
        }

        for attr in attributes {
            let attr_path = join(path, &attr.name);
            match map.get(&attr.name) {
                None | Some(JsonValue::Null) => {
                    if attr.presence == Presence::Required {
                        self.push(&attr_path, "required attribute is missing".to_string());
                    }
                }
                Some(value) => {
                    if !attr.presence.is_settable() && !self.allow_computed {
                        self.push(
                            &attr_path,
                            "attribute is computed and cannot be set".to_string(),
                        );
                        continue;
                    }
                    self.value(&attr.attr_type, &attr.validators, value, &attr_path);
                }
            }
        }
    }

    fn value(
        &mut self,
        attr_type: &AttributeType,
        validators: &[Validator],
        value: &JsonValue,
        path: &str,
    ) {
        if !self.shape(attr_type, value, path) {
            return;
        }
        for validator in validators {
            if let Some(message) = validator.check(value) {
                self.push(path, message);
            }
        }
    }

    /// Check the type shape, recursing into collections; false on mismatch
    fn shape(&mut self, attr_type: &AttributeType, value: &JsonValue, path: &str) -> bool {
        let ok = match (attr_type, value) {
            (AttributeType::Dynamic, _) => true,
            (AttributeType::String, JsonValue::String(_)) => true,
            (AttributeType::Bool, JsonValue::Bool(_)) => true,
            (AttributeType::Int64, JsonValue::Number(n)) => n.is_i64(),
            (AttributeType::Float64, JsonValue::Number(_)) => true,
            (AttributeType::List(element), JsonValue::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    self.element(element, item, &format!("{}[{}]", path, i));
                }
                true
            }
            (AttributeType::Map(element), JsonValue::Object(entries)) => {
                for (key, item) in entries {
                    self.element(element, item, &format!("{}[\"{}\"]", path, key));
                }
                true
            }
            (AttributeType::Object(children), JsonValue::Object(map)) => {
                self.object(children, map, path);
                true
            }
            _ => false,
        };
        if !ok {
            self.push(
                path,
                format!("expected {}, got {}", attr_type.label(), kind_of(value)),
            );
        }
        ok
    }

    fn element(&mut self, element: &Element, item: &JsonValue, path: &str) {
        if item.is_null() {
            self.push(path, "null elements are not allowed".to_string());
            return;
        }
        self.value(&element.attr_type, &element.validators, item, path);
    }
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "(root)".to_string()
    } else {
        path.to_string()
    }
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => "integer",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::CrdScope;
    use crate::descriptor::{ResourceDescriptor, ResourceMode};
    use serde_json::json;

    fn schema() -> ResourceSchema {
        let conf = AttributeSpec::new(
            "conf",
            "conf",
            AttributeType::list(Element::new(AttributeType::Object(vec![
                AttributeSpec::new("operation", "operation", AttributeType::String, Presence::Required)
                    .with_validator(Validator::OneOf(vec![
                        json!("Add"),
                        json!("Remove"),
                        json!("Patch"),
                    ])),
                AttributeSpec::new("weight", "weight", AttributeType::Int64, Presence::Optional)
                    .with_validator(Validator::Range {
                        min: Some(0.0),
                        max: Some(100.0),
                        exclusive_min: false,
                        exclusive_max: false,
                    }),
            ]))),
            Presence::Optional,
        );

        ResourceSchema {
            descriptor: ResourceDescriptor::new(
                "kuma.io",
                "v1alpha1",
                "MeshProxyPatch",
                "meshproxypatches",
                CrdScope::Namespaced,
                ResourceMode::Resource,
            )
            .unwrap(),
            attributes: vec![
                AttributeSpec::new("id", "id", AttributeType::String, Presence::OptionalComputed),
                AttributeSpec::new("kind", "kind", AttributeType::String, Presence::Computed),
                AttributeSpec::new(
                    "metadata",
                    "metadata",
                    AttributeType::Object(vec![AttributeSpec::new(
                        "name",
                        "name",
                        AttributeType::String,
                        Presence::Required,
                    )]),
                    Presence::Required,
                ),
                AttributeSpec::new(
                    "spec",
                    "spec",
                    AttributeType::Object(vec![conf]),
                    Presence::Optional,
                ),
            ],
            description: None,
            deprecation: None,
        }
    }

    #[test]
    fn test_valid_config() {
        let result = schema().validate(&json!({
            "metadata": {"name": "patch"},
            "spec": {"conf": [{"operation": "Add", "weight": 10}]}
        }));
        assert!(result.is_valid, "{:?}", result.errors);
    }

    #[test]
    fn test_enum_rejected_with_path() {
        let result = schema().validate(&json!({
            "metadata": {"name": "patch"},
            "spec": {"conf": [{"operation": "Add"}, {"operation": "Delete"}]}
        }));
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].path, "spec.conf[1].operation");
        assert!(result.errors[0].message.contains("Delete"));
    }

    #[test]
    fn test_missing_required() {
        let result = schema().validate(&json!({"metadata": {}}));
        assert_eq!(result.errors[0].path, "metadata.name");
        assert!(result.errors[0].message.contains("required"));

        let result = schema().validate(&json!({"metadata": {"name": null}}));
        assert!(!result.is_valid);
    }

    #[test]
    fn test_unknown_attribute_suggestion() {
        let result = schema().validate(&json!({
            "metadata": {"name": "patch"},
            "spek": {}
        }));
        assert_eq!(result.errors[0].path, "spek");
        assert_eq!(
            result.errors[0].suggestion.as_deref(),
            Some("did you mean 'spec'?")
        );
    }

    #[test]
    fn test_type_mismatch() {
        let result = schema().validate(&json!({
            "metadata": {"name": "patch"},
            "spec": {"conf": [{"operation": "Add", "weight": "heavy"}]}
        }));
        assert_eq!(result.errors[0].path, "spec.conf[0].weight");
        assert_eq!(result.errors[0].message, "expected int64, got string");
    }

    #[test]
    fn test_computed_attribute() {
        let config = json!({"metadata": {"name": "patch"}, "kind": "MeshProxyPatch"});
        assert!(!schema().validate(&config).is_valid);
        assert!(schema().validate_plan(&config).is_valid);
    }

    #[test]
    fn test_root_must_be_object() {
        let result = schema().validate(&json!([]));
        assert_eq!(result.errors[0].path, "(root)");
    }
}
