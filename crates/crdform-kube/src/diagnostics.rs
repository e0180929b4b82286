//! Diagnostics attached to provider responses

use serde::Serialize;

use crate::error::{AdapterError, ApiError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One message for the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Attribute path the message refers to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: None,
            attribute: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }
}

/// Ordered list of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn has_errors(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diagnostic: Diagnostic) -> Self {
        Self(vec![diagnostic])
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl From<&AdapterError> for Diagnostics {
    fn from(error: &AdapterError) -> Self {
        match error {
            AdapterError::Validation(issues) => Self(
                issues
                    .iter()
                    .map(|issue| {
                        let diagnostic = Diagnostic::error(issue.message.clone())
                            .with_attribute(issue.path.clone());
                        match &issue.suggestion {
                            Some(suggestion) => diagnostic.with_detail(suggestion.clone()),
                            None => diagnostic,
                        }
                    })
                    .collect(),
            ),
            AdapterError::Codec(e) => Diagnostic::error(format!("Failed to decode {}", e.origin))
                .with_detail(e.message.clone())
                .with_attribute(e.path.clone())
                .into(),
            AdapterError::UnknownResourceType {
                suggestion: Some(suggestion),
                ..
            } => Diagnostic::error(error.to_string())
                .with_detail(suggestion.clone())
                .into(),
            AdapterError::Apply { resource, source } => {
                api_diagnostic("failed to apply", resource, source)
            }
            AdapterError::Get { resource, source } => {
                api_diagnostic("failed to read", resource, source)
            }
            AdapterError::Delete { resource, source } => {
                api_diagnostic("failed to delete", resource, source)
            }
            other => Diagnostic::error(other.to_string()).into(),
        }
    }
}

fn api_diagnostic(action: &str, resource: &str, source: &ApiError) -> Diagnostics {
    Diagnostic::error(format!("{} {}", action, resource))
        .with_detail(format!("{} ({})", source.message, source.reason))
        .into()
}
