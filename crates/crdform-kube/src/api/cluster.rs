//! Resource API backed by a live cluster
//!
//! Objects are addressed without discovery: the descriptor already carries
//! group, version, kind and plural, so the `ApiResource` is built directly.

use async_trait::async_trait;
use kube::{
    Client,
    api::{Api, DeleteParams, DynamicObject, Patch, PatchParams, PropagationPolicy},
    core::GroupVersionKind,
    discovery::ApiResource,
};
use serde_json::Value as JsonValue;

use super::{ApplyParams, ObjectRef, ResourceApi};
use crate::error::ApiError;

/// [`ResourceApi`] over `kube::Api<DynamicObject>`
#[derive(Clone)]
pub struct KubeResourceApi {
    client: Client,
}

impl KubeResourceApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Create an Api client for the object's type and scope
    fn api_for(&self, object: &ObjectRef) -> Api<DynamicObject> {
        let gvk = GroupVersionKind::gvk(&object.group, &object.version, &object.kind);
        let api_resource = ApiResource::from_gvk_with_plural(&gvk, &object.plural);
        match &object.namespace {
            Some(namespace) => Api::namespaced_with(self.client.clone(), namespace, &api_resource),
            None => Api::all_with(self.client.clone(), &api_resource),
        }
    }
}

#[async_trait]
impl ResourceApi for KubeResourceApi {
    async fn apply(
        &self,
        object: &ObjectRef,
        document: &JsonValue,
        params: &ApplyParams,
    ) -> Result<JsonValue, ApiError> {
        let api = self.api_for(object);

        let mut patch_params = PatchParams::apply(&params.field_manager);
        patch_params.force = params.force;

        tracing::debug!(
            object = %object,
            field_manager = %params.field_manager,
            force = params.force,
            "server-side apply"
        );

        let applied = api
            .patch(&object.name, &patch_params, &Patch::Apply(document))
            .await?;
        Ok(serde_json::to_value(applied)?)
    }

    async fn get(&self, object: &ObjectRef) -> Result<JsonValue, ApiError> {
        tracing::debug!(object = %object, "get");
        let current = self.api_for(object).get(&object.name).await?;
        Ok(serde_json::to_value(current)?)
    }

    async fn delete(&self, object: &ObjectRef) -> Result<(), ApiError> {
        tracing::debug!(object = %object, "delete");
        let params = DeleteParams {
            propagation_policy: Some(PropagationPolicy::Background),
            ..Default::default()
        };
        self.api_for(object).delete(&object.name, &params).await?;
        Ok(())
    }
}
