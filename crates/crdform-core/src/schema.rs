//! Attribute schema tree
//!
//! A `ResourceSchema` is the host-facing shape of one generated type. It is
//! produced by the schema mirror from a CRD version and consulted by the
//! codec and the validator on every operation.

use regex::Regex;
use serde_json::{Map, Value as JsonValue, json};

use crate::descriptor::ResourceDescriptor;

/// Whether the user must, may, or cannot set an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    /// Set by the provider only
    Computed,
    /// Optional in config, filled in by the provider when absent
    OptionalComputed,
}

impl Presence {
    /// Whether a user may write the attribute in configuration
    pub fn is_settable(&self) -> bool {
        !matches!(self, Self::Computed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::Optional => "optional",
            Self::Computed => "computed",
            Self::OptionalComputed => "optional+computed",
        }
    }
}

/// Semantic type of an attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeType {
    String,
    Bool,
    Int64,
    Float64,
    /// Raw JSON passthrough (int-or-string, preserve-unknown-fields)
    Dynamic,
    List(Box<Element>),
    /// String-keyed map
    Map(Box<Element>),
    Object(Vec<AttributeSpec>),
}

impl AttributeType {
    pub fn list(element: Element) -> Self {
        Self::List(Box::new(element))
    }

    pub fn map(element: Element) -> Self {
        Self::Map(Box::new(element))
    }

    /// Short type label used in messages and schema output
    pub fn label(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Int64 => "int64".to_string(),
            Self::Float64 => "float64".to_string(),
            Self::Dynamic => "dynamic".to_string(),
            Self::List(e) => format!("list({})", e.attr_type.label()),
            Self::Map(e) => format!("map({})", e.attr_type.label()),
            Self::Object(_) => "object".to_string(),
        }
    }

    /// Child attributes when this is an object type
    pub fn children(&self) -> Option<&[AttributeSpec]> {
        match self {
            Self::Object(children) => Some(children),
            _ => None,
        }
    }
}

/// Element type of a list or map
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub attr_type: AttributeType,
    pub validators: Vec<Validator>,
}

impl Element {
    pub fn new(attr_type: AttributeType) -> Self {
        Self {
            attr_type,
            validators: Vec::new(),
        }
    }

    pub fn string() -> Self {
        Self::new(AttributeType::String)
    }
}

/// Value constraint attached to an attribute or element
#[derive(Debug, Clone)]
pub enum Validator {
    /// Allow-list of values
    OneOf(Vec<JsonValue>),
    /// Numeric bound
    Range {
        min: Option<f64>,
        max: Option<f64>,
        exclusive_min: bool,
        exclusive_max: bool,
    },
    /// Regular expression a string must match
    Pattern(Regex),
    /// String length bound (in characters)
    Length { min: Option<u64>, max: Option<u64> },
    /// List or map size bound
    ItemCount { min: Option<u64>, max: Option<u64> },
    /// No two list items are equal
    UniqueItems,
    /// No two list items share the same values for these attributes
    UniqueKeys(Vec<String>),
}

impl PartialEq for Validator {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::OneOf(a), Self::OneOf(b)) => a == b,
            (
                Self::Range {
                    min: a_min,
                    max: a_max,
                    exclusive_min: a_emin,
                    exclusive_max: a_emax,
                },
                Self::Range {
                    min: b_min,
                    max: b_max,
                    exclusive_min: b_emin,
                    exclusive_max: b_emax,
                },
            ) => a_min == b_min && a_max == b_max && a_emin == b_emin && a_emax == b_emax,
            (Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
            (Self::Length { min: a1, max: a2 }, Self::Length { min: b1, max: b2 }) => {
                a1 == b1 && a2 == b2
            }
            (Self::ItemCount { min: a1, max: a2 }, Self::ItemCount { min: b1, max: b2 }) => {
                a1 == b1 && a2 == b2
            }
            (Self::UniqueItems, Self::UniqueItems) => true,
            (Self::UniqueKeys(a), Self::UniqueKeys(b)) => a == b,
            _ => false,
        }
    }
}

impl Validator {
    /// Check a protocol value, returning a message when it is rejected
    pub fn check(&self, value: &JsonValue) -> Option<String> {
        match self {
            Self::OneOf(allowed) => {
                if allowed.contains(value) {
                    None
                } else {
                    Some(format!(
                        "value {} is not one of [{}]",
                        value,
                        allowed
                            .iter()
                            .map(JsonValue::to_string)
                            .collect::<Vec<_>>()
                            .join(", ")
                    ))
                }
            }
            Self::Range {
                min,
                max,
                exclusive_min,
                exclusive_max,
            } => {
                let n = value.as_f64()?;
                if let Some(min) = min {
                    if (*exclusive_min && n <= *min) || n < *min {
                        let op = if *exclusive_min { ">" } else { ">=" };
                        return Some(format!("value {} must be {} {}", value, op, min));
                    }
                }
                if let Some(max) = max {
                    if (*exclusive_max && n >= *max) || n > *max {
                        let op = if *exclusive_max { "<" } else { "<=" };
                        return Some(format!("value {} must be {} {}", value, op, max));
                    }
                }
                None
            }
            Self::Pattern(regex) => {
                let s = value.as_str()?;
                if regex.is_match(s) {
                    None
                } else {
                    Some(format!(
                        "value \"{}\" does not match pattern '{}'",
                        s,
                        regex.as_str()
                    ))
                }
            }
            Self::Length { min, max } => {
                let len = value.as_str()?.chars().count() as u64;
                bound_message("string length", len, *min, *max)
            }
            Self::ItemCount { min, max } => {
                let len = match value {
                    JsonValue::Array(items) => items.len(),
                    JsonValue::Object(map) => map.len(),
                    _ => return None,
                } as u64;
                bound_message("item count", len, *min, *max)
            }
            Self::UniqueItems => {
                let items = value.as_array()?;
                items
                    .iter()
                    .enumerate()
                    .find(|(i, item)| items[..*i].contains(item))
                    .map(|(i, item)| format!("item {} at index {} is a duplicate", item, i))
            }
            Self::UniqueKeys(keys) => {
                let items = value.as_array()?;
                let key_of = |item: &JsonValue| -> Vec<JsonValue> {
                    keys.iter()
                        .map(|k| item.get(k).cloned().unwrap_or(JsonValue::Null))
                        .collect()
                };
                let seen: Vec<Vec<JsonValue>> = items.iter().map(key_of).collect();
                seen.iter()
                    .enumerate()
                    .find(|(i, key)| seen[..*i].contains(key))
                    .map(|(i, _)| {
                        format!(
                            "item at index {} duplicates the key ({}) of an earlier item",
                            i,
                            keys.join(", ")
                        )
                    })
            }
        }
    }

    /// Schema output form
    pub fn describe(&self) -> JsonValue {
        match self {
            Self::OneOf(allowed) => json!({ "one_of": allowed }),
            Self::Range {
                min,
                max,
                exclusive_min,
                exclusive_max,
            } => json!({
                "range": {
                    "min": min,
                    "max": max,
                    "exclusive_min": exclusive_min,
                    "exclusive_max": exclusive_max,
                }
            }),
            Self::Pattern(regex) => json!({ "pattern": regex.as_str() }),
            Self::Length { min, max } => json!({ "length": { "min": min, "max": max } }),
            Self::ItemCount { min, max } => json!({ "item_count": { "min": min, "max": max } }),
            Self::UniqueItems => json!("unique_items"),
            Self::UniqueKeys(keys) => json!({ "unique_keys": keys }),
        }
    }
}

fn bound_message(what: &str, len: u64, min: Option<u64>, max: Option<u64>) -> Option<String> {
    if let Some(min) = min.filter(|m| len < *m) {
        return Some(format!("{} {} is less than {}", what, len, min));
    }
    if let Some(max) = max.filter(|m| len > *m) {
        return Some(format!("{} {} is greater than {}", what, len, max));
    }
    None
}

/// One node of the attribute tree
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeSpec {
    /// Host-facing snake_case name
    pub name: String,
    /// JSON key on the wire
    pub wire_name: String,
    pub attr_type: AttributeType,
    pub presence: Presence,
    pub description: Option<String>,
    pub default: Option<JsonValue>,
    pub validators: Vec<Validator>,
    pub sensitive: bool,
}

impl AttributeSpec {
    pub fn new(
        name: impl Into<String>,
        wire_name: impl Into<String>,
        attr_type: AttributeType,
        presence: Presence,
    ) -> Self {
        Self {
            name: name.into(),
            wire_name: wire_name.into(),
            attr_type,
            presence,
            description: None,
            default: None,
            validators: Vec::new(),
            sensitive: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Look up a direct child by host-facing name
    pub fn child(&self, name: &str) -> Option<&AttributeSpec> {
        self.attr_type
            .children()
            .and_then(|c| c.iter().find(|a| a.name == name))
    }

    /// Schema output form
    pub fn describe(&self) -> JsonValue {
        let mut out = Map::new();
        out.insert("type".into(), json!(self.attr_type.label()));
        out.insert("presence".into(), json!(self.presence.as_str()));
        if self.wire_name != self.name {
            out.insert("wire_name".into(), json!(self.wire_name));
        }
        if let Some(description) = &self.description {
            out.insert("description".into(), json!(description));
        }
        if let Some(default) = &self.default {
            out.insert("default".into(), default.clone());
        }
        if self.sensitive {
            out.insert("sensitive".into(), json!(true));
        }
        if !self.validators.is_empty() {
            out.insert(
                "validators".into(),
                self.validators.iter().map(Validator::describe).collect(),
            );
        }
        if let Some(nested) = describe_nested(&self.attr_type) {
            out.insert("attributes".into(), nested);
        }
        JsonValue::Object(out)
    }
}

fn describe_nested(attr_type: &AttributeType) -> Option<JsonValue> {
    match attr_type {
        AttributeType::Object(children) => Some(describe_attributes(children)),
        AttributeType::List(e) | AttributeType::Map(e) => {
            let nested = describe_nested(&e.attr_type);
            if e.validators.is_empty() {
                return nested;
            }
            let mut out = Map::new();
            out.insert(
                "element_validators".into(),
                e.validators.iter().map(Validator::describe).collect(),
            );
            if let Some(nested) = nested {
                out.insert("attributes".into(), nested);
            }
            Some(JsonValue::Object(out))
        }
        _ => None,
    }
}

fn describe_attributes(attributes: &[AttributeSpec]) -> JsonValue {
    JsonValue::Object(
        attributes
            .iter()
            .map(|a| (a.name.clone(), a.describe()))
            .collect(),
    )
}

/// Complete attribute tree of one generated type
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceSchema {
    pub descriptor: ResourceDescriptor,
    /// Top-level attributes, in declaration order
    pub attributes: Vec<AttributeSpec>,
    pub description: Option<String>,
    /// Deprecation warning of the mirrored CRD version
    pub deprecation: Option<String>,
}

impl ResourceSchema {
    pub fn type_name(&self) -> String {
        self.descriptor.type_name()
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Look up a nested attribute by dotted host-facing path
    /// (e.g. "metadata.name" or "spec.target_ref.kind")
    ///
    /// List and map elements are traversed transparently.
    pub fn attribute_path(&self, path: &str) -> Option<&AttributeSpec> {
        let mut parts = path.split('.');
        let mut current = self.attribute(parts.next()?)?;
        for part in parts {
            let mut attr_type = &current.attr_type;
            while let AttributeType::List(e) | AttributeType::Map(e) = attr_type {
                attr_type = &e.attr_type;
            }
            current = attr_type.children()?.iter().find(|a| a.name == part)?;
        }
        Some(current)
    }

    /// Schema output form, used by `crdform schema`
    pub fn describe(&self) -> JsonValue {
        let mut out = Map::new();
        out.insert("type_name".into(), json!(self.type_name()));
        out.insert("api_version".into(), json!(self.descriptor.api_version()));
        out.insert("kind".into(), json!(self.descriptor.kind));
        out.insert("mode".into(), json!(self.descriptor.mode));
        out.insert("scope".into(), json!(self.descriptor.scope));
        if let Some(description) = &self.description {
            out.insert("description".into(), json!(description));
        }
        if let Some(deprecation) = &self.deprecation {
            out.insert("deprecation".into(), json!(deprecation));
        }
        out.insert("attributes".into(), describe_attributes(&self.attributes));
        JsonValue::Object(out)
    }
}
