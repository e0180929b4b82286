//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// Configuration rejected by the schema
    #[error("Validation failed: {message}")]
    #[diagnostic(code(crdform::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A provider operation returned error diagnostics
    #[error("{operation} failed with {errors} error(s)")]
    #[diagnostic(code(crdform::cli::operation))]
    Operation { operation: String, errors: usize },

    /// Unknown type, bad CRD file or provider configuration
    #[error("Configuration error: {message}")]
    #[diagnostic(code(crdform::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(crdform::cli::io))]
    Io { message: String },

    /// Wrapped error for passthrough (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(crdform::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Operation { .. } => exit_codes::OPERATION_ERROR,
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a validation error with the number of failed checks
    pub fn validation(errors: usize) -> Self {
        Self::Validation {
            message: format!("{} error(s)", errors),
            help: Some("run `crdform schema <type>` to see the accepted attributes".to_string()),
        }
    }

    pub fn operation(operation: impl Into<String>, errors: usize) -> Self {
        Self::Operation {
            operation: operation.into(),
            errors,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: None,
        }
    }

    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Other {
            message: format!("failed to serialize output: {}", err),
        }
    }
}

impl From<crdform_core::CoreError> for CliError {
    fn from(err: crdform_core::CoreError) -> Self {
        match err {
            crdform_core::CoreError::Io(e) => e.into(),
            other => CliError::config(other.to_string()),
        }
    }
}

impl From<crdform_kube::AdapterError> for CliError {
    fn from(err: crdform_kube::AdapterError) -> Self {
        CliError::config(err.to_string())
    }
}

impl From<miette::Report> for CliError {
    fn from(err: miette::Report) -> Self {
        CliError::Other {
            message: format!("{:?}", err),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
