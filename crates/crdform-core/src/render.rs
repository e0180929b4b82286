//! Manifest rendering

use serde_json::{Map, Value as JsonValue};

use crate::error::Result;

/// Render a wire document as YAML with keys sorted at every level
pub fn render_manifest(document: &JsonValue) -> Result<String> {
    Ok(serde_yaml::to_string(&sorted(document))?)
}

fn sorted(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut out = Map::with_capacity(map.len());
            for key in keys {
                out.insert(key.clone(), sorted(&map[key.as_str()]));
            }
            JsonValue::Object(out)
        }
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(sorted).collect()),
        other => other.clone(),
    }
}
