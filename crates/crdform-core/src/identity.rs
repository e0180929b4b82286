//! Object identity and import addressing

use thiserror::Error;

use crate::crd::CrdScope;

/// Malformed import identifier
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid import identifier '{raw}': expected {expected}")]
pub struct ImportFormatError {
    pub raw: String,
    pub expected: &'static str,
}

/// Address of one object: `namespace/name`, or `name` when cluster-scoped
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    pub namespace: Option<String>,
    pub name: String,
}

impl Identity {
    pub fn namespaced(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: name.into(),
        }
    }

    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            namespace: None,
            name: name.into(),
        }
    }

    /// Parse an import identifier for a CRD of the given scope
    ///
    /// Namespaced: exactly one `/`, both sides non-empty.
    /// Cluster: a non-empty name without `/`.
    pub fn parse(raw: &str, scope: CrdScope) -> Result<Self, ImportFormatError> {
        match scope {
            CrdScope::Namespaced => {
                let mut parts = raw.split('/');
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(ns), Some(name), None) if !ns.is_empty() && !name.is_empty() => {
                        Ok(Self::namespaced(ns, name))
                    }
                    _ => Err(ImportFormatError {
                        raw: raw.to_string(),
                        expected: "<namespace>/<name>",
                    }),
                }
            }
            CrdScope::Cluster => {
                if raw.is_empty() || raw.contains('/') {
                    Err(ImportFormatError {
                        raw: raw.to_string(),
                        expected: "<name>",
                    })
                } else {
                    Ok(Self::cluster(raw))
                }
            }
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}", ns, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_namespaced() {
        let id = Identity::parse("kuma-system/retry", CrdScope::Namespaced).unwrap();
        assert_eq!(id.namespace.as_deref(), Some("kuma-system"));
        assert_eq!(id.name, "retry");
        assert_eq!(id.to_string(), "kuma-system/retry");
    }

    #[test]
    fn test_parse_namespaced_rejects_malformed() {
        for raw in ["bad", "/name", "ns/", "a/b/c", "", "/"] {
            let err = Identity::parse(raw, CrdScope::Namespaced).unwrap_err();
            assert_eq!(err.raw, raw);
        }
    }

    #[test]
    fn test_parse_cluster() {
        let id = Identity::parse("default", CrdScope::Cluster).unwrap();
        assert_eq!(id, Identity::cluster("default"));
        assert_eq!(id.to_string(), "default");
        assert!(Identity::parse("ns/default", CrdScope::Cluster).is_err());
        assert!(Identity::parse("", CrdScope::Cluster).is_err());
    }
}
