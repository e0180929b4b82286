//! crdform Core - Kubernetes CRDs as declarative-configuration resources
//!
//! This crate provides the generic engine shared by every generated type:
//! - `ResourceDescriptor`: static identity of one CRD version in one mode
//! - `SchemaMirror`: CRD OpenAPI schema -> `ResourceSchema` attribute tree
//! - `StateCodec`: `ResourceState` <-> host JSON and wire JSON
//! - `Registry`: the descriptor table, built from CRD YAML
//! - `Identity`: `namespace/name` addressing for import

pub mod codec;
pub mod crd;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod field;
pub mod identity;
pub mod mirror;
pub mod registry;
pub mod render;
pub mod schema;
pub mod state;
pub mod suggestions;
pub mod validation;
pub mod value;

pub use codec::{CodecError, PayloadOrigin, StateCodec};
pub use crd::{CrdParser, CrdSchema, CrdScope};
pub use descriptor::{ResourceDescriptor, ResourceMode};
pub use document::{Document, parse_set_values};
pub use error::{CoreError, Result};
pub use field::Field;
pub use identity::{Identity, ImportFormatError};
pub use mirror::SchemaMirror;
pub use registry::Registry;
pub use render::render_manifest;
pub use schema::{AttributeSpec, AttributeType, Element, Presence, ResourceSchema, Validator};
pub use state::ResourceState;
pub use validation::{ValidationIssue, ValidationResult};
pub use value::{AttrValue, ObjectValue};
