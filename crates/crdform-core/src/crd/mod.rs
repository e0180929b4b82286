//! CustomResourceDefinition parsing
//!
//! - **Schema representation** (`schema`): structural types for CRDs
//! - **Parsing** (`parser`): CRD YAML into schema structures

mod parser;
mod schema;

pub use parser::CrdParser;
pub use schema::{
    AdditionalProperties, CrdNames, CrdSchema, CrdScope, CrdVersionSchema, OpenApiSchema,
    PropertyType, SchemaProperty,
};
