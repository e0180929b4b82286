//! Layered input documents
//!
//! Configuration files given on the command line are merged in order, then
//! `--set key=value` overrides are applied on top.

use serde_json::{Map, Value as JsonValue};
use std::path::Path;

use crate::error::{CoreError, Result};

/// Untyped JSON form of a configuration, plan or state
#[derive(Debug, Clone, PartialEq)]
pub struct Document(JsonValue);

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty object
    pub fn new() -> Self {
        Self(JsonValue::Object(Map::new()))
    }

    /// JSON when the extension is `.json`, YAML otherwise
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        if path.extension().is_some_and(|e| e == "json") {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(Self(serde_yaml::from_str(yaml)?))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self(serde_json::from_str(json)?))
    }

    /// Overlay another document
    ///
    /// Objects merge key by key; lists and scalars of the overlay replace
    /// whatever was there.
    pub fn merge(&mut self, overlay: &Document) {
        deep_merge(&mut self.0, &overlay.0);
    }

    /// Set a value by dotted path (e.g. `spec.target_ref.kind`), creating
    /// intermediate objects
    pub fn set(&mut self, path: &str, value: JsonValue) -> Result<()> {
        let keys: Vec<&str> = path.split('.').collect();
        if keys.iter().any(|k| k.is_empty()) {
            return Err(CoreError::MissingField {
                field: format!("empty segment in path '{}'", path),
            });
        }

        set_path(&mut self.0, &keys, value);
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&JsonValue> {
        path.split('.').try_fold(&self.0, |node, key| node.get(key))
    }

    pub fn into_inner(self) -> JsonValue {
        self.0
    }
}

fn set_path(node: &mut JsonValue, keys: &[&str], value: JsonValue) {
    let Some((key, rest)) = keys.split_first() else {
        *node = value;
        return;
    };
    if !node.is_object() {
        *node = JsonValue::Object(Map::new());
    }
    if let JsonValue::Object(map) = node {
        let child = map.entry(key.to_string()).or_insert(JsonValue::Null);
        set_path(child, rest, value);
    }
}

fn deep_merge(base: &mut JsonValue, overlay: &JsonValue) {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

/// Parse `--set key=value` arguments into a document
///
/// Values are read as booleans, null, numbers or inline JSON lists and
/// objects when they look like one, and as strings otherwise.
pub fn parse_set_values(set_args: &[String]) -> Result<Document> {
    let mut document = Document::new();
    for arg in set_args {
        let (key, raw) = arg.split_once('=').ok_or_else(|| CoreError::MissingField {
            field: format!("value in --set '{}' (expected key=value)", arg),
        })?;
        document.set(key, parse_scalar(raw))?;
    }
    Ok(document)
}

fn parse_scalar(raw: &str) -> JsonValue {
    match raw {
        "true" => return JsonValue::Bool(true),
        "false" => return JsonValue::Bool(false),
        "null" => return JsonValue::Null,
        _ => {}
    }
    if let Ok(int) = raw.parse::<i64>() {
        return JsonValue::from(int);
    }
    if let Some(number) = raw.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        return JsonValue::Number(number);
    }
    if raw.starts_with('[') || raw.starts_with('{') {
        if let Ok(value) = serde_json::from_str(raw) {
            return value;
        }
    }
    JsonValue::String(raw.to_string())
}
