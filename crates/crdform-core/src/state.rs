//! Decoded resource instance

use crate::codec::{CodecError, PayloadOrigin};
use crate::crd::CrdScope;
use crate::descriptor::ResourceDescriptor;
use crate::field::Field;
use crate::identity::Identity;
use crate::value::{AttrValue, ObjectValue};

/// One resource instance, decoded from configuration, plan, state or the
/// server
///
/// Built fresh for every operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceState {
    pub id: Field<String>,
    pub force_conflicts: Field<bool>,
    pub field_manager: Field<String>,
    /// Map of field path -> expected value
    pub wait_for: Field<AttrValue>,
    pub yaml: Field<String>,
    pub api_version: Field<String>,
    pub kind: Field<String>,
    pub metadata: Field<ObjectValue>,
    pub spec: Field<AttrValue>,
}

impl ResourceState {
    /// `metadata.name`, if set
    pub fn name(&self) -> Option<&str> {
        self.metadata.value().and_then(|m| m.get_str("name"))
    }

    /// `metadata.namespace`, if set
    pub fn namespace(&self) -> Option<&str> {
        self.metadata.value().and_then(|m| m.get_str("namespace"))
    }

    /// Identity derived from metadata
    ///
    /// `None` when the name (or, for namespaced CRDs, the namespace) is
    /// missing.
    pub fn identity(&self, scope: CrdScope) -> Option<Identity> {
        let name = self.name().filter(|n| !n.is_empty())?;
        match scope {
            CrdScope::Namespaced => {
                let namespace = self.namespace().filter(|n| !n.is_empty())?;
                Some(Identity::namespaced(namespace, name))
            }
            CrdScope::Cluster => Some(Identity::cluster(name)),
        }
    }

    /// Overwrite `apiVersion` and `kind` from the descriptor
    pub fn set_type_meta(&mut self, descriptor: &ResourceDescriptor) {
        self.api_version = Field::Value(descriptor.api_version());
        self.kind = Field::Value(descriptor.kind.clone());
    }

    /// Take `metadata` and `spec` from a server response, keeping every
    /// provider-owned field as is
    pub fn merge_remote(&mut self, metadata: Field<ObjectValue>, spec: Field<AttrValue>) {
        self.metadata = metadata;
        self.spec = spec;
    }

    /// Seed state for importing an existing object
    pub fn seed(identity: &Identity) -> Self {
        let mut metadata = ObjectValue::new().with("name", identity.name.as_str());
        if let Some(namespace) = &identity.namespace {
            metadata.set("namespace", Field::Value(namespace.as_str().into()));
        }
        Self {
            id: Field::Value(identity.to_string()),
            metadata: Field::Value(metadata),
            ..Default::default()
        }
    }

    /// Flatten into a host-facing object keyed by top-level attribute name
    pub(crate) fn to_object(&self) -> ObjectValue {
        let mut object = ObjectValue::new();
        object.set("id", self.id.clone().map(AttrValue::String));
        object.set(
            "force_conflicts",
            self.force_conflicts.clone().map(AttrValue::Bool),
        );
        object.set(
            "field_manager",
            self.field_manager.clone().map(AttrValue::String),
        );
        object.set("wait_for", self.wait_for.clone());
        object.set("yaml", self.yaml.clone().map(AttrValue::String));
        object.set("api_version", self.api_version.clone().map(AttrValue::String));
        object.set("kind", self.kind.clone().map(AttrValue::String));
        object.set("metadata", self.metadata.clone().map(AttrValue::Object));
        object.set("spec", self.spec.clone());
        object
    }

    /// Inverse of [`ResourceState::to_object`]
    pub(crate) fn from_object(
        object: &ObjectValue,
        origin: PayloadOrigin,
    ) -> Result<Self, CodecError> {
        let string = |name: &str| -> Result<Field<String>, CodecError> {
            project(object, name, origin, "string", |v| match v {
                AttrValue::String(s) => Some(s.clone()),
                _ => None,
            })
        };

        Ok(Self {
            id: string("id")?,
            force_conflicts: project(object, "force_conflicts", origin, "bool", AttrValue::as_bool)?,
            field_manager: string("field_manager")?,
            wait_for: object.get("wait_for").clone(),
            yaml: string("yaml")?,
            api_version: string("api_version")?,
            kind: string("kind")?,
            metadata: project(object, "metadata", origin, "object", |v| {
                v.as_object().cloned()
            })?,
            spec: object.get("spec").clone(),
        })
    }
}

fn project<T>(
    object: &ObjectValue,
    name: &str,
    origin: PayloadOrigin,
    expected: &str,
    f: impl Fn(&AttrValue) -> Option<T>,
) -> Result<Field<T>, CodecError> {
    match object.get(name) {
        Field::Unset => Ok(Field::Unset),
        Field::Null => Ok(Field::Null),
        Field::Value(v) => f(v).map(Field::Value).ok_or_else(|| CodecError {
            origin,
            path: name.to_string(),
            message: format!("expected {}", expected),
        }),
    }
}
