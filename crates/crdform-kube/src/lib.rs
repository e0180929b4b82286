//! crdform Kube - cluster side of crdform
//!
//! This crate provides:
//! - **Resource API**: untyped server-side apply, get and delete, with a
//!   kube-backed and an in-memory implementation
//! - **Adapters**: Create/Read/Update/Delete/Import for resources, lookups
//!   for data sources, offline rendering for manifests
//! - **Provider**: the request/response facade that turns every failure
//!   into diagnostics

pub mod adapter;
pub mod api;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod protocol;
pub mod provider;

pub use adapter::{DataSourceAdapter, ManifestAdapter, ReadOutcome, ResourceAdapter, import_state};
pub use api::{
    ApplyParams, KubeResourceApi, MockOperation, MockResourceApi, ObjectRef, OperationCounts,
    ResourceApi,
};
pub use config::{ApplyDefaults, DEFAULT_FIELD_MANAGER, ProviderConfig};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{AdapterError, ApiError, Result};
pub use protocol::{
    CreateRequest, DeleteRequest, DiagnosticsResponse, ImportStateRequest, ReadConfigRequest,
    ReadRequest, SchemaResponse, StateResponse, TypeListing, UpdateRequest, ValidateRequest,
};
pub use provider::Provider;
