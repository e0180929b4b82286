//! Typed attribute values
//!
//! `AttrValue` is the in-memory form of one attribute, shaped by its
//! `AttributeType`. Objects keep one tri-state `Field` per attribute.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;

use crate::field::Field;

static UNSET: Field<AttrValue> = Field::Unset;

/// Value of a single attribute
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    /// Ordered list; duplicates preserved
    List(Vec<AttrValue>),
    /// String-keyed map in insertion order
    Map(IndexMap<String, AttrValue>),
    Object(ObjectValue),
    /// Raw JSON for int-or-string and preserve-unknown-fields attributes
    Dynamic(JsonValue),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, AttrValue>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<ObjectValue> for AttrValue {
    fn from(o: ObjectValue) -> Self {
        Self::Object(o)
    }
}

/// Nested object: attribute name -> tri-state field
///
/// Attributes that were never inserted read back as `Field::Unset`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectValue {
    fields: IndexMap<String, Field<AttrValue>>,
}

impl ObjectValue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field for an attribute, `Unset` when absent
    pub fn get(&self, name: &str) -> &Field<AttrValue> {
        self.fields.get(name).unwrap_or(&UNSET)
    }

    /// Set a field; inserting `Unset` removes the attribute
    pub fn set(&mut self, name: impl Into<String>, field: Field<AttrValue>) {
        let name = name.into();
        if field.is_unset() {
            self.fields.shift_remove(&name);
        } else {
            self.fields.insert(name, field);
        }
    }

    /// Builder-style variant of [`ObjectValue::set`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.set(name, Field::Value(value.into()));
        self
    }

    /// String value of an attribute, if set
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).value().and_then(AttrValue::as_str)
    }

    /// Iterate over attributes that are not `Unset`
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field<AttrValue>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of attributes that are not `Unset`
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_attribute_is_unset() {
        let obj = ObjectValue::new().with("name", "retry");
        assert_eq!(obj.get_str("name"), Some("retry"));
        assert!(obj.get("namespace").is_unset());
    }

    #[test]
    fn test_set_unset_removes() {
        let mut obj = ObjectValue::new().with("name", "retry");
        obj.set("name", Field::Unset);
        assert!(obj.is_empty());
    }

    #[test]
    fn test_null_is_kept() {
        let mut obj = ObjectValue::new();
        obj.set("labels", Field::Null);
        assert_eq!(obj.len(), 1);
        assert!(obj.get("labels").is_null());
    }

    #[test]
    fn test_accessors() {
        assert_eq!(AttrValue::from(3i64).as_i64(), Some(3));
        assert_eq!(AttrValue::from(true).as_bool(), Some(true));
        assert!(AttrValue::from("x").as_object().is_none());
        let list = AttrValue::List(vec!["a".into(), "a".into()]);
        assert_eq!(list.as_list().map(<[AttrValue]>::len), Some(2));
    }
}
