//! Error types for crdform-kube

use crdform_core::{CodecError, CoreError, ImportFormatError, ValidationIssue};
use thiserror::Error;

/// Result type for crdform-kube operations
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Failure reported by the resource API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    /// HTTP status code, `None` for transport failures
    pub code: Option<u16>,
    pub reason: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: u16, reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            reason: reason.into(),
            message: message.into(),
        }
    }

    /// A 404 for the named object
    pub fn not_found(name: &str) -> Self {
        Self::new(404, "NotFound", format!("\"{}\" not found", name))
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            code: None,
            reason: "Transport".to_string(),
            message: message.into(),
        }
    }

    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        self.code == Some(404)
    }

    /// Check if this is a conflict error (409)
    pub fn is_conflict(&self) -> bool {
        self.code == Some(409)
    }
}

impl From<kube::Error> for ApiError {
    fn from(e: kube::Error) -> Self {
        match e {
            kube::Error::Api(resp) => Self::new(resp.code, resp.reason, resp.message),
            other => Self::transport(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        Self::transport(format!("invalid object: {}", e))
    }
}

/// Errors of provider operations
///
/// Every variant is turned into diagnostics on the response; none of them
/// ends the process.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AdapterError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("failed to apply {resource}: {source}")]
    Apply {
        resource: String,
        #[source]
        source: ApiError,
    },

    #[error("failed to read {resource}: {source}")]
    Get {
        resource: String,
        #[source]
        source: ApiError,
    },

    #[error("failed to delete {resource}: {source}")]
    Delete {
        resource: String,
        #[source]
        source: ApiError,
    },

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error(transparent)]
    ImportFormat(#[from] ImportFormatError),

    #[error("invalid provider configuration: {0}")]
    Configuration(String),

    #[error("configuration is invalid ({} error(s))", .0.len())]
    Validation(Vec<ValidationIssue>),

    #[error("unknown {mode} type '{type_name}'")]
    UnknownResourceType {
        type_name: String,
        mode: String,
        suggestion: Option<String>,
    },

    /// State that cannot be acted on (missing or changed identity)
    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl AdapterError {
    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Apply { source, .. } | Self::Get { source, .. } | Self::Delete { source, .. } => {
                source.is_not_found()
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_predicates() {
        assert!(ApiError::not_found("retry").is_not_found());
        assert!(ApiError::new(409, "Conflict", "field manager conflict").is_conflict());
        assert!(!ApiError::transport("connection refused").is_not_found());
    }

    #[test]
    fn test_adapter_error_not_found() {
        let err = AdapterError::Get {
            resource: "MeshRetry default/retry".to_string(),
            source: ApiError::not_found("retry"),
        };
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "failed to read MeshRetry default/retry: \"retry\" not found"
        );

        let err = AdapterError::Apply {
            resource: "MeshRetry default/retry".to_string(),
            source: ApiError::new(403, "Forbidden", "forbidden"),
        };
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_validation_display() {
        let err = AdapterError::Validation(vec![ValidationIssue {
            path: "spec".to_string(),
            message: "unknown attribute".to_string(),
            suggestion: None,
        }]);
        assert_eq!(err.to_string(), "configuration is invalid (1 error(s))");
    }
}
