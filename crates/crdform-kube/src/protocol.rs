//! Request and response types of the provider facade
//!
//! Documents are host JSON: snake_case attribute names, `null` for
//! explicitly empty values.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crdform_core::ResourceMode;

use crate::diagnostics::Diagnostics;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub type_name: String,
    pub mode: ResourceMode,
    pub config: JsonValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRequest {
    pub type_name: String,
    pub plan: JsonValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadRequest {
    pub type_name: String,
    pub state: JsonValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub type_name: String,
    pub prior_state: JsonValue,
    pub plan: JsonValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub type_name: String,
    pub state: JsonValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportStateRequest {
    pub type_name: String,
    /// `namespace/name`, or `name` for cluster-scoped types
    pub id: String,
}

/// Data source and manifest reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadConfigRequest {
    pub type_name: String,
    pub config: JsonValue,
}

/// Response carrying a new state
///
/// `state` is `None` when the operation failed, and after a Read that found
/// the object gone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StateResponse {
    pub state: Option<JsonValue>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiagnosticsResponse {
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaResponse {
    pub schema: Option<JsonValue>,
    pub diagnostics: Diagnostics,
}

/// Type names exposed per mode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeListing {
    pub resources: Vec<String>,
    pub data_sources: Vec<String>,
    pub manifests: Vec<String>,
}
