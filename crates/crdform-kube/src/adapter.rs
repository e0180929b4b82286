//! CRUD adapters
//!
//! One adapter per mode, each bound to a mirrored schema and (for the modes
//! that reach the cluster) a [`ResourceApi`]. Adapters are built per request
//! and hold no state of their own.
//!
//! Only `metadata` and `spec` are taken from the server; provider-owned
//! fields (`id`, apply knobs, `wait_for`) always come from the plan.

use serde_json::Value as JsonValue;

use crdform_core::{
    CrdScope, Field, Identity, PayloadOrigin, ResourceSchema, ResourceState, StateCodec,
    ValidationResult, render_manifest,
};

use crate::api::{ApplyParams, ObjectRef, ResourceApi};
use crate::config::ApplyDefaults;
use crate::error::{AdapterError, Result};

/// Outcome of reading a managed resource
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Present(ResourceState),
    /// The object no longer exists; the host decides what to do next
    Absent,
}

fn ensure_valid(result: ValidationResult) -> Result<()> {
    if result.is_valid {
        Ok(())
    } else {
        Err(AdapterError::Validation(result.errors))
    }
}

fn identity_from_metadata(schema: &ResourceSchema, state: &ResourceState) -> Result<Identity> {
    state.identity(schema.descriptor.scope).ok_or_else(|| {
        let missing = match schema.descriptor.scope {
            CrdScope::Namespaced => "metadata.name and metadata.namespace",
            CrdScope::Cluster => "metadata.name",
        };
        AdapterError::InvalidState(format!("{} must be set", missing))
    })
}

/// Identity of stored state; freshly imported state only carries `id`
fn identity_from_state(schema: &ResourceSchema, state: &ResourceState) -> Result<Identity> {
    let scope = schema.descriptor.scope;
    if let Some(identity) = state.identity(scope) {
        return Ok(identity);
    }
    match state.id.value() {
        Some(id) => Ok(Identity::parse(id, scope)?),
        None => Err(AdapterError::InvalidState(
            "state has neither metadata.name nor id".to_string(),
        )),
    }
}

/// Adapter for mutable resources
pub struct ResourceAdapter<'a> {
    schema: &'a ResourceSchema,
    api: &'a dyn ResourceApi,
    defaults: &'a ApplyDefaults,
}

impl<'a> ResourceAdapter<'a> {
    pub fn new(
        schema: &'a ResourceSchema,
        api: &'a dyn ResourceApi,
        defaults: &'a ApplyDefaults,
    ) -> Self {
        Self {
            schema,
            api,
            defaults,
        }
    }

    fn codec(&self) -> StateCodec<'a> {
        StateCodec::new(self.schema)
    }

    /// Create the object from a plan
    ///
    /// Unset apply knobs are resolved against the provider defaults and
    /// recorded in the returned state.
    pub async fn create(&self, plan: &JsonValue) -> Result<ResourceState> {
        ensure_valid(self.schema.validate_plan(plan))?;

        let mut state = self.codec().decode_config(plan, PayloadOrigin::LocalConfig)?;
        let identity = identity_from_metadata(self.schema, &state)?;
        state.id = Field::Value(identity.to_string());
        state.set_type_meta(&self.schema.descriptor);

        let params = self.defaults.resolve(&state);
        state.field_manager = Field::Value(params.field_manager.clone());
        state.force_conflicts = Field::Value(params.force);

        tracing::info!(
            type_name = %self.schema.type_name(),
            id = %identity,
            "creating resource"
        );
        self.apply(state, &identity, &params).await
    }

    /// Refresh state from the cluster
    pub async fn read(&self, prior: &JsonValue) -> Result<ReadOutcome> {
        let codec = self.codec();
        let mut state = codec.decode_config(prior, PayloadOrigin::LocalConfig)?;
        let identity = identity_from_state(self.schema, &state)?;

        let object = ObjectRef::new(&self.schema.descriptor, &identity);
        let current = match self.api.get(&object).await {
            Ok(current) => current,
            Err(e) if e.is_not_found() => {
                tracing::info!(object = %object, "resource no longer exists");
                return Ok(ReadOutcome::Absent);
            }
            Err(source) => {
                return Err(AdapterError::Get {
                    resource: object.to_string(),
                    source,
                });
            }
        };

        let (metadata, spec) = codec.decode_wire(&current)?;
        state.merge_remote(metadata, spec);
        state.set_type_meta(&self.schema.descriptor);
        if !state.id.is_set() {
            state.id = Field::Value(identity.to_string());
        }
        Ok(ReadOutcome::Present(state))
    }

    /// Apply a changed plan to an existing object
    ///
    /// The object's identity cannot change; the prior `id` is kept. Apply
    /// knobs are taken from the plan as they are.
    pub async fn update(&self, prior: &JsonValue, plan: &JsonValue) -> Result<ResourceState> {
        ensure_valid(self.schema.validate_plan(plan))?;

        let codec = self.codec();
        let prior_state = codec.decode_config(prior, PayloadOrigin::LocalConfig)?;
        let mut state = codec.decode_config(plan, PayloadOrigin::LocalConfig)?;
        let identity = identity_from_metadata(self.schema, &state)?;

        if let Some(prior_identity) = prior_state.identity(self.schema.descriptor.scope) {
            if prior_identity != identity {
                return Err(AdapterError::InvalidState(format!(
                    "identity changed from '{}' to '{}'; the resource must be replaced",
                    prior_identity, identity
                )));
            }
        }

        state.id = prior_state.id.or(Field::Value(identity.to_string()));
        state.set_type_meta(&self.schema.descriptor);

        let params = self.defaults.resolve(&state);
        tracing::info!(
            type_name = %self.schema.type_name(),
            id = %identity,
            "updating resource"
        );
        self.apply(state, &identity, &params).await
    }

    /// Delete the object; an object that is already gone counts as deleted
    pub async fn delete(&self, prior: &JsonValue) -> Result<()> {
        let state = self.codec().decode_config(prior, PayloadOrigin::LocalConfig)?;
        let identity = identity_from_state(self.schema, &state)?;
        let object = ObjectRef::new(&self.schema.descriptor, &identity);

        match self.api.delete(&object).await {
            Ok(()) => {
                tracing::info!(object = %object, "deleted resource");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(object = %object, "resource already deleted");
                Ok(())
            }
            Err(source) => Err(AdapterError::Delete {
                resource: object.to_string(),
                source,
            }),
        }
    }

    async fn apply(
        &self,
        mut state: ResourceState,
        identity: &Identity,
        params: &ApplyParams,
    ) -> Result<ResourceState> {
        let codec = self.codec();
        let object = ObjectRef::new(&self.schema.descriptor, identity);
        let document = codec.encode_wire(&state);

        let applied = self
            .api
            .apply(&object, &document, params)
            .await
            .map_err(|source| AdapterError::Apply {
                resource: object.to_string(),
                source,
            })?;

        let (metadata, spec) = codec.decode_wire(&applied)?;
        state.merge_remote(metadata, spec);
        Ok(state)
    }
}

/// Seed state from an import identifier; the rest comes from Read
pub fn import_state(schema: &ResourceSchema, raw: &str) -> Result<ResourceState> {
    let identity = Identity::parse(raw, schema.descriptor.scope)?;
    tracing::debug!(type_name = %schema.type_name(), id = %identity, "importing");
    Ok(ResourceState::seed(&identity))
}

/// Adapter for read-only lookups
pub struct DataSourceAdapter<'a> {
    schema: &'a ResourceSchema,
    api: &'a dyn ResourceApi,
}

impl<'a> DataSourceAdapter<'a> {
    pub fn new(schema: &'a ResourceSchema, api: &'a dyn ResourceApi) -> Self {
        Self { schema, api }
    }

    /// Look up an existing object; it must exist
    pub async fn read(&self, config: &JsonValue) -> Result<ResourceState> {
        ensure_valid(self.schema.validate(config))?;

        let codec = StateCodec::new(self.schema);
        let mut state = codec.decode_config(config, PayloadOrigin::LocalConfig)?;
        let identity = identity_from_metadata(self.schema, &state)?;
        let object = ObjectRef::new(&self.schema.descriptor, &identity);

        let current = self.api.get(&object).await.map_err(|source| {
            if source.is_not_found() {
                AdapterError::NotFound {
                    resource: object.to_string(),
                }
            } else {
                AdapterError::Get {
                    resource: object.to_string(),
                    source,
                }
            }
        })?;

        let (metadata, spec) = codec.decode_wire(&current)?;
        state.merge_remote(metadata, spec);
        state.set_type_meta(&self.schema.descriptor);
        state.id = Field::Value(identity.to_string());
        Ok(state)
    }
}

/// Adapter rendering configuration to YAML without touching the cluster
pub struct ManifestAdapter<'a> {
    schema: &'a ResourceSchema,
}

impl<'a> ManifestAdapter<'a> {
    pub fn new(schema: &'a ResourceSchema) -> Self {
        Self { schema }
    }

    pub fn read(&self, config: &JsonValue) -> Result<ResourceState> {
        ensure_valid(self.schema.validate(config))?;

        let codec = StateCodec::new(self.schema);
        let mut state = codec.decode_config(config, PayloadOrigin::LocalConfig)?;
        let identity = identity_from_metadata(self.schema, &state)?;
        if !state.id.is_set() {
            state.id = Field::Value(identity.to_string());
        }
        state.set_type_meta(&self.schema.descriptor);
        state.yaml = Field::Value(render_manifest(&codec.encode_wire(&state))?);
        Ok(state)
    }
}
