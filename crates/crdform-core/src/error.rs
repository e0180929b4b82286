//! Core error types

use thiserror::Error;

use crate::codec::CodecError;
use crate::identity::ImportFormatError;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid resource descriptor: {message}")]
    InvalidDescriptor { message: String },

    #[error("Invalid CRD schema: {message}")]
    InvalidSchema { message: String },

    #[error("Duplicate resource type: {type_name}")]
    DuplicateType { type_name: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    ImportFormat(#[from] ImportFormatError),

    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

pub type Result<T> = std::result::Result<T, CoreError>;
