//! State codec
//!
//! Maps a `ResourceState` to and from two JSON shapes:
//!
//! - the host-facing shape, keyed by snake_case attribute names, where an
//!   explicit `null` is kept as `Field::Null`
//! - the wire shape sent to and received from the API server, keyed by the
//!   CRD's own (camelCase) names, where neither `Unset` nor `Null` fields
//!   are ever written
//!
//! In both directions a key missing from a document decodes to
//! `Field::Unset`, never to a zero value.

use indexmap::IndexMap;
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use crate::field::Field;
use crate::schema::{AttributeSpec, AttributeType, ResourceSchema};
use crate::state::ResourceState;
use crate::value::{AttrValue, ObjectValue};

/// Where a decoded payload came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadOrigin {
    /// Configuration, plan or prior state handed over by the host
    LocalConfig,
    /// Object returned by the API server
    ServerResponse,
}

impl std::fmt::Display for PayloadOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LocalConfig => write!(f, "local configuration"),
            Self::ServerResponse => write!(f, "server response"),
        }
    }
}

/// A payload that does not fit the attribute tree
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Failed to decode {origin} at '{path}': {message}")]
pub struct CodecError {
    pub origin: PayloadOrigin,
    /// Attribute path, `(root)` for the document itself
    pub path: String,
    pub message: String,
}

/// Key naming of a JSON shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Naming {
    Host,
    Wire,
}

impl Naming {
    fn key<'a>(&self, attribute: &'a AttributeSpec) -> &'a str {
        match self {
            Self::Host => &attribute.name,
            Self::Wire => &attribute.wire_name,
        }
    }
}

/// Codec bound to one resource schema
pub struct StateCodec<'a> {
    schema: &'a ResourceSchema,
}

impl<'a> StateCodec<'a> {
    pub fn new(schema: &'a ResourceSchema) -> Self {
        Self { schema }
    }

    /// Decode host-facing JSON (configuration, plan or state)
    pub fn decode_config(
        &self,
        json: &JsonValue,
        origin: PayloadOrigin,
    ) -> Result<ResourceState, CodecError> {
        let decoder = Decoder {
            naming: Naming::Host,
            origin,
            strict: true,
        };
        let object = decoder.object(&self.schema.attributes, json, "")?;
        ResourceState::from_object(&object, origin)
    }

    /// Encode into host-facing JSON
    ///
    /// `Unset` fields are omitted, `Null` fields are written as `null`.
    pub fn encode_state(&self, state: &ResourceState) -> JsonValue {
        let object = state.to_object();
        encode_object(&self.schema.attributes, &object, Naming::Host)
    }

    /// Encode into the wire document sent to the API server
    ///
    /// `apiVersion` and `kind` always come from the descriptor. Provider
    /// fields (`id`, knobs, `yaml`) never reach the wire.
    pub fn encode_wire(&self, state: &ResourceState) -> JsonValue {
        let descriptor = &self.schema.descriptor;
        let mut out = Map::new();
        out.insert(
            "apiVersion".to_string(),
            JsonValue::String(descriptor.api_version()),
        );
        out.insert("kind".to_string(), JsonValue::String(descriptor.kind.clone()));

        for (name, field) in [
            ("metadata", state.metadata.as_ref().map(|m| AttrValue::Object(m.clone()))),
            ("spec", state.spec.clone()),
        ] {
            let (Some(attribute), Field::Value(value)) = (self.schema.attribute(name), field)
            else {
                continue;
            };
            out.insert(
                attribute.wire_name.clone(),
                encode_value(&attribute.attr_type, &value, Naming::Wire),
            );
        }

        JsonValue::Object(out)
    }

    /// Decode `metadata` and `spec` from a server object
    ///
    /// Keys the schema does not know (status, managedFields, ...) are
    /// ignored.
    pub fn decode_wire(
        &self,
        json: &JsonValue,
    ) -> Result<(Field<ObjectValue>, Field<AttrValue>), CodecError> {
        let state = self.decode_wire_state(json)?;
        Ok((state.metadata, state.spec))
    }

    /// Decode a server object into a full state, including `apiVersion`
    /// and `kind`
    pub fn decode_wire_state(&self, json: &JsonValue) -> Result<ResourceState, CodecError> {
        let decoder = Decoder {
            naming: Naming::Wire,
            origin: PayloadOrigin::ServerResponse,
            strict: false,
        };
        let wire_attributes: Vec<&AttributeSpec> = ["api_version", "kind", "metadata", "spec"]
            .iter()
            .filter_map(|name| self.schema.attribute(name))
            .collect();

        let map = decoder.map(json, "")?;
        let mut object = ObjectValue::new();
        for attribute in wire_attributes {
            let field = decoder.field(attribute, map, "")?;
            object.set(attribute.name.clone(), field);
        }
        ResourceState::from_object(&object, PayloadOrigin::ServerResponse)
    }
}

struct Decoder {
    naming: Naming,
    origin: PayloadOrigin,
    /// Reject keys the schema does not know
    strict: bool,
}

impl Decoder {
    fn error(&self, path: &str, message: impl Into<String>) -> CodecError {
        CodecError {
            origin: self.origin,
            path: if path.is_empty() {
                "(root)".to_string()
            } else {
                path.to_string()
            },
            message: message.into(),
        }
    }

    fn map<'j>(
        &self,
        json: &'j JsonValue,
        path: &str,
    ) -> Result<&'j Map<String, JsonValue>, CodecError> {
        json.as_object()
            .ok_or_else(|| self.error(path, format!("expected object, got {}", kind_of(json))))
    }

    fn object(
        &self,
        attributes: &[AttributeSpec],
        json: &JsonValue,
        path: &str,
    ) -> Result<ObjectValue, CodecError> {
        let map = self.map(json, path)?;

        if self.strict {
            if let Some(unknown) = map
                .keys()
                .find(|k| attributes.iter().all(|a| self.naming.key(a) != k.as_str()))
            {
                return Err(self.error(&join(path, unknown), "unknown attribute"));
            }
        }

        let mut object = ObjectValue::new();
        for attribute in attributes {
            let field = self.field(attribute, map, path)?;
            object.set(attribute.name.clone(), field);
        }
        Ok(object)
    }

    fn field(
        &self,
        attribute: &AttributeSpec,
        map: &Map<String, JsonValue>,
        path: &str,
    ) -> Result<Field<AttrValue>, CodecError> {
        let key = self.naming.key(attribute);
        let attr_path = join(path, &attribute.name);
        match map.get(key) {
            None => Ok(Field::Unset),
            Some(JsonValue::Null) => Ok(Field::Null),
            Some(value) => self
                .value(&attribute.attr_type, value, &attr_path)
                .map(Field::Value),
        }
    }

    fn value(
        &self,
        attr_type: &AttributeType,
        json: &JsonValue,
        path: &str,
    ) -> Result<AttrValue, CodecError> {
        let mismatch = || {
            self.error(
                path,
                format!("expected {}, got {}", attr_type.label(), kind_of(json)),
            )
        };

        match attr_type {
            AttributeType::String => json
                .as_str()
                .map(|s| AttrValue::String(s.to_string()))
                .ok_or_else(mismatch),
            AttributeType::Bool => json.as_bool().map(AttrValue::Bool).ok_or_else(mismatch),
            AttributeType::Int64 => json.as_i64().map(AttrValue::Int).ok_or_else(mismatch),
            AttributeType::Float64 => json.as_f64().map(AttrValue::Float).ok_or_else(mismatch),
            AttributeType::Dynamic => Ok(AttrValue::Dynamic(json.clone())),
            AttributeType::List(element) => {
                let items = json.as_array().ok_or_else(mismatch)?;
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| {
                        let item_path = format!("{}[{}]", path, i);
                        if item.is_null() {
                            return Err(self.error(&item_path, "null elements are not allowed"));
                        }
                        self.value(&element.attr_type, item, &item_path)
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map(AttrValue::List)
            }
            AttributeType::Map(element) => {
                let entries = json.as_object().ok_or_else(mismatch)?;
                let mut out = IndexMap::with_capacity(entries.len());
                for (key, item) in entries {
                    let item_path = format!("{}[\"{}\"]", path, key);
                    if item.is_null() {
                        return Err(self.error(&item_path, "null elements are not allowed"));
                    }
                    out.insert(key.clone(), self.value(&element.attr_type, item, &item_path)?);
                }
                Ok(AttrValue::Map(out))
            }
            AttributeType::Object(children) => {
                if !json.is_object() {
                    return Err(mismatch());
                }
                self.object(children, json, path).map(AttrValue::Object)
            }
        }
    }
}

fn encode_object(attributes: &[AttributeSpec], object: &ObjectValue, naming: Naming) -> JsonValue {
    let mut out = Map::new();
    for attribute in attributes {
        match object.get(&attribute.name) {
            Field::Unset => {}
            Field::Null => {
                if naming == Naming::Host {
                    out.insert(naming.key(attribute).to_string(), JsonValue::Null);
                }
            }
            Field::Value(value) => {
                out.insert(
                    naming.key(attribute).to_string(),
                    encode_value(&attribute.attr_type, value, naming),
                );
            }
        }
    }
    JsonValue::Object(out)
}

fn encode_value(attr_type: &AttributeType, value: &AttrValue, naming: Naming) -> JsonValue {
    let element_type = match attr_type {
        AttributeType::List(e) | AttributeType::Map(e) => &e.attr_type,
        _ => &AttributeType::Dynamic,
    };

    match value {
        AttrValue::String(s) => JsonValue::String(s.clone()),
        AttrValue::Bool(b) => JsonValue::Bool(*b),
        AttrValue::Int(i) => JsonValue::from(*i),
        AttrValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        AttrValue::Dynamic(json) => json.clone(),
        AttrValue::List(items) => JsonValue::Array(
            items
                .iter()
                .map(|item| encode_value(element_type, item, naming))
                .collect(),
        ),
        AttrValue::Map(entries) => JsonValue::Object(
            entries
                .iter()
                .map(|(k, v)| (k.clone(), encode_value(element_type, v, naming)))
                .collect(),
        ),
        AttrValue::Object(object) => match attr_type {
            AttributeType::Object(children) => encode_object(children, object, naming),
            // untyped object: keep names as they are
            _ => JsonValue::Object(
                object
                    .iter()
                    .filter_map(|(k, f)| match f {
                        Field::Value(v) => Some((
                            k.to_string(),
                            encode_value(&AttributeType::Dynamic, v, naming),
                        )),
                        Field::Null if naming == Naming::Host => {
                            Some((k.to_string(), JsonValue::Null))
                        }
                        _ => None,
                    })
                    .collect(),
            ),
        },
    }
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

fn kind_of(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "object",
    }
}
