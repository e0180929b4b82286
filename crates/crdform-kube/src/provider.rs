//! Provider facade
//!
//! The host-facing entry point. Every operation takes a request and returns
//! a response with diagnostics; failures never escape as `Err`.

use std::sync::Arc;

use serde_json::Value as JsonValue;

use crdform_core::suggestions::closest_match;
use crdform_core::{Registry, ResourceMode, ResourceSchema, StateCodec};

use crate::adapter::{
    DataSourceAdapter, ManifestAdapter, ReadOutcome, ResourceAdapter, import_state,
};
use crate::api::{KubeResourceApi, ResourceApi};
use crate::config::{ApplyDefaults, ProviderConfig};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{AdapterError, Result};
use crate::protocol::{
    CreateRequest, DeleteRequest, DiagnosticsResponse, ImportStateRequest, ReadConfigRequest,
    ReadRequest, SchemaResponse, StateResponse, TypeListing, UpdateRequest, ValidateRequest,
};

/// Registry, cluster handle and apply defaults shared by all operations
#[derive(Clone)]
pub struct Provider {
    registry: Arc<Registry>,
    api: Option<Arc<dyn ResourceApi>>,
    defaults: ApplyDefaults,
}

impl Provider {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
            api: None,
            defaults: ApplyDefaults::default(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Connect to the cluster described by `config`
    ///
    /// Offline configurations keep the provider usable for validation and
    /// manifests only.
    pub async fn configure(&mut self, config: &ProviderConfig) -> DiagnosticsResponse {
        self.defaults = config.apply_defaults();
        self.api = None;

        if config.offline {
            tracing::info!("provider configured offline");
            return DiagnosticsResponse::default();
        }

        match config.client().await {
            Ok(client) => {
                self.api = Some(Arc::new(KubeResourceApi::new(client)));
                DiagnosticsResponse::default()
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to configure cluster client");
                DiagnosticsResponse {
                    diagnostics: Diagnostics::from(&e),
                }
            }
        }
    }

    /// Configure with an existing resource API
    pub fn configure_with_api(&mut self, config: &ProviderConfig, api: Arc<dyn ResourceApi>) {
        self.defaults = config.apply_defaults();
        self.api = Some(api);
    }

    pub fn resource_types(&self) -> TypeListing {
        TypeListing {
            resources: self.registry.type_names(ResourceMode::Resource),
            data_sources: self.registry.type_names(ResourceMode::DataSource),
            manifests: self.registry.type_names(ResourceMode::Manifest),
        }
    }

    pub fn schema(&self, mode: ResourceMode, type_name: &str) -> SchemaResponse {
        let mut diagnostics = Diagnostics::new();
        match self.lookup(mode, type_name, &mut diagnostics) {
            Ok(schema) => SchemaResponse {
                schema: Some(schema.describe()),
                diagnostics,
            },
            Err(e) => {
                diagnostics.extend(Diagnostics::from(&e));
                SchemaResponse {
                    schema: None,
                    diagnostics,
                }
            }
        }
    }

    /// Check configuration against the schema without contacting the cluster
    pub fn validate(&self, request: &ValidateRequest) -> DiagnosticsResponse {
        let mut diagnostics = Diagnostics::new();
        let result = self
            .lookup(request.mode, &request.type_name, &mut diagnostics)
            .and_then(|schema| {
                let result = schema.validate(&request.config);
                if result.is_valid {
                    Ok(())
                } else {
                    Err(AdapterError::Validation(result.errors))
                }
            });
        if let Err(e) = result {
            diagnostics.extend(Diagnostics::from(&e));
        }
        DiagnosticsResponse { diagnostics }
    }

    pub async fn create(&self, request: &CreateRequest) -> StateResponse {
        let mut diagnostics = Diagnostics::new();
        let result: Result<Option<JsonValue>> = async {
            let schema = self.lookup(ResourceMode::Resource, &request.type_name, &mut diagnostics)?;
            let api = self.api()?;
            let state = ResourceAdapter::new(schema, api, &self.defaults)
                .create(&request.plan)
                .await?;
            Ok(Some(StateCodec::new(schema).encode_state(&state)))
        }
        .await;
        state_response(result, diagnostics)
    }

    /// Refresh state; a missing object yields no state and no error
    pub async fn read(&self, request: &ReadRequest) -> StateResponse {
        let mut diagnostics = Diagnostics::new();
        let result: Result<Option<JsonValue>> = async {
            let schema = self.lookup(ResourceMode::Resource, &request.type_name, &mut diagnostics)?;
            let api = self.api()?;
            let outcome = ResourceAdapter::new(schema, api, &self.defaults)
                .read(&request.state)
                .await?;
            Ok(match outcome {
                ReadOutcome::Present(state) => Some(StateCodec::new(schema).encode_state(&state)),
                ReadOutcome::Absent => None,
            })
        }
        .await;
        state_response(result, diagnostics)
    }

    pub async fn update(&self, request: &UpdateRequest) -> StateResponse {
        let mut diagnostics = Diagnostics::new();
        let result: Result<Option<JsonValue>> = async {
            let schema = self.lookup(ResourceMode::Resource, &request.type_name, &mut diagnostics)?;
            let api = self.api()?;
            let state = ResourceAdapter::new(schema, api, &self.defaults)
                .update(&request.prior_state, &request.plan)
                .await?;
            Ok(Some(StateCodec::new(schema).encode_state(&state)))
        }
        .await;
        state_response(result, diagnostics)
    }

    pub async fn delete(&self, request: &DeleteRequest) -> DiagnosticsResponse {
        let mut diagnostics = Diagnostics::new();
        let result: Result<()> = async {
            let schema = self.lookup(ResourceMode::Resource, &request.type_name, &mut diagnostics)?;
            let api = self.api()?;
            ResourceAdapter::new(schema, api, &self.defaults)
                .delete(&request.state)
                .await
        }
        .await;
        if let Err(e) = result {
            tracing::warn!(error = %e, "delete failed");
            diagnostics.extend(Diagnostics::from(&e));
        }
        DiagnosticsResponse { diagnostics }
    }

    /// Seed state for an import; needs no cluster access
    pub fn import_state(&self, request: &ImportStateRequest) -> StateResponse {
        let mut diagnostics = Diagnostics::new();
        let result = self
            .lookup(ResourceMode::Resource, &request.type_name, &mut diagnostics)
            .and_then(|schema| {
                let seed = import_state(schema, &request.id)?;
                Ok(Some(StateCodec::new(schema).encode_state(&seed)))
            });
        state_response(result, diagnostics)
    }

    pub async fn read_data_source(&self, request: &ReadConfigRequest) -> StateResponse {
        let mut diagnostics = Diagnostics::new();
        let result: Result<Option<JsonValue>> = async {
            let schema =
                self.lookup(ResourceMode::DataSource, &request.type_name, &mut diagnostics)?;
            let api = self.api()?;
            let state = DataSourceAdapter::new(schema, api)
                .read(&request.config)
                .await?;
            Ok(Some(StateCodec::new(schema).encode_state(&state)))
        }
        .await;
        state_response(result, diagnostics)
    }

    /// Render a manifest; works offline
    pub fn read_manifest(&self, request: &ReadConfigRequest) -> StateResponse {
        let mut diagnostics = Diagnostics::new();
        let result = self
            .lookup(ResourceMode::Manifest, &request.type_name, &mut diagnostics)
            .and_then(|schema| {
                let state = ManifestAdapter::new(schema).read(&request.config)?;
                Ok(Some(StateCodec::new(schema).encode_state(&state)))
            });
        state_response(result, diagnostics)
    }

    fn api(&self) -> Result<&dyn ResourceApi> {
        self.api.as_deref().ok_or_else(|| {
            AdapterError::Configuration(
                "no cluster connection is configured (offline or configure failed)".to_string(),
            )
        })
    }

    /// Find a schema, warning about deprecated types
    fn lookup(
        &self,
        mode: ResourceMode,
        type_name: &str,
        diagnostics: &mut Diagnostics,
    ) -> Result<&ResourceSchema> {
        let Some(schema) = self.registry.get(mode, type_name) else {
            let known = self.registry.type_names(mode);
            let suggestion = closest_match(type_name, known.iter().map(String::as_str))
                .map(|c| format!("did you mean '{}'?", c));
            return Err(AdapterError::UnknownResourceType {
                type_name: type_name.to_string(),
                mode: mode.to_string(),
                suggestion,
            });
        };

        if let Some(deprecation) = &schema.deprecation {
            diagnostics.push(
                Diagnostic::warning(format!("{} is deprecated", type_name))
                    .with_detail(deprecation.clone()),
            );
        }
        Ok(schema)
    }
}

fn state_response(result: Result<Option<JsonValue>>, mut diagnostics: Diagnostics) -> StateResponse {
    match result {
        Ok(state) => StateResponse { state, diagnostics },
        Err(e) => {
            tracing::warn!(error = %e, "operation failed");
            diagnostics.extend(Diagnostics::from(&e));
            StateResponse {
                state: None,
                diagnostics,
            }
        }
    }
}
