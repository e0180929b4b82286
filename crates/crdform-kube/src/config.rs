//! Provider configuration
//!
//! Loaded once at configure time from `~/.config/crdform/provider.yaml` or an
//! explicit path. Everything is optional; an empty file means "infer the
//! cluster from the environment".

use std::path::{Path, PathBuf};

use kube::config::{KubeConfigOptions, Kubeconfig, KubeconfigError};
use kube::{Client, Config};
use serde::{Deserialize, Serialize};

use crate::api::ApplyParams;
use crate::error::{AdapterError, Result};
use crdform_core::ResourceState;

/// Field manager used when neither the resource nor the provider names one
pub const DEFAULT_FIELD_MANAGER: &str = "crdform";

/// Provider-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderConfig {
    /// Path to a kubeconfig file
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context
    pub context: Option<String>,
    /// Never contact the cluster
    pub offline: bool,
    pub field_manager: String,
    pub force_conflicts: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kubeconfig: None,
            context: None,
            offline: false,
            field_manager: DEFAULT_FIELD_MANAGER.to_string(),
            force_conflicts: false,
        }
    }
}

impl ProviderConfig {
    /// Load from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AdapterError::Configuration(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| AdapterError::Configuration(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Load from the default location, or defaults if the file is absent
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(path),
            _ => Ok(Self::default()),
        }
    }

    /// `<config dir>/crdform/provider.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("crdform").join("provider.yaml"))
    }

    fn check(&self) -> Result<()> {
        if self.field_manager.trim().is_empty() {
            return Err(AdapterError::Configuration(
                "fieldManager must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn apply_defaults(&self) -> ApplyDefaults {
        ApplyDefaults {
            field_manager: self.field_manager.clone(),
            force_conflicts: self.force_conflicts,
        }
    }

    /// Build a Kubernetes client from this configuration
    pub async fn client(&self) -> Result<Client> {
        if self.offline {
            return Err(AdapterError::Configuration(
                "provider is offline; cluster operations are disabled".to_string(),
            ));
        }

        let options = KubeConfigOptions {
            context: self.context.clone(),
            ..Default::default()
        };

        let load_error = |e: KubeconfigError| {
            AdapterError::Configuration(format!("failed to load kubeconfig: {}", e))
        };

        let config = match (&self.kubeconfig, &self.context) {
            (Some(path), _) => {
                let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                    AdapterError::Configuration(format!(
                        "failed to read kubeconfig {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(load_error)?
            }
            (None, Some(_)) => Config::from_kubeconfig(&options).await.map_err(load_error)?,
            (None, None) => Config::infer().await.map_err(|e| {
                AdapterError::Configuration(format!("failed to infer cluster config: {}", e))
            })?,
        };

        tracing::debug!(cluster_url = %config.cluster_url, "configured cluster client");

        Client::try_from(config)
            .map_err(|e| AdapterError::Configuration(format!("failed to create client: {}", e)))
    }
}

/// Provider-level fallbacks for the per-resource apply knobs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyDefaults {
    pub field_manager: String,
    pub force_conflicts: bool,
}

impl Default for ApplyDefaults {
    fn default() -> Self {
        ProviderConfig::default().apply_defaults()
    }
}

impl ApplyDefaults {
    /// Apply options for a resource: its own knobs first, then these defaults
    pub fn resolve(&self, state: &ResourceState) -> ApplyParams {
        ApplyParams {
            field_manager: state
                .field_manager
                .value()
                .filter(|m| !m.is_empty())
                .cloned()
                .unwrap_or_else(|| self.field_manager.clone()),
            force: state
                .force_conflicts
                .value()
                .copied()
                .unwrap_or(self.force_conflicts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crdform_core::Field;

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::from_yaml("").unwrap();
        assert_eq!(config, ProviderConfig::default());
        assert_eq!(config.field_manager, "crdform");
        assert!(!config.offline);
    }

    #[test]
    fn test_camel_case_keys() {
        let config = ProviderConfig::from_yaml(
            "kubeconfig: /tmp/kubeconfig\ncontext: kind-kuma\nfieldManager: platform\nforceConflicts: true\n",
        )
        .unwrap();
        assert_eq!(config.kubeconfig, Some(PathBuf::from("/tmp/kubeconfig")));
        assert_eq!(config.context.as_deref(), Some("kind-kuma"));
        assert_eq!(config.field_manager, "platform");
        assert!(config.force_conflicts);
    }

    #[test]
    fn test_rejects_empty_field_manager() {
        let err = ProviderConfig::from_yaml("fieldManager: ''\n").unwrap_err();
        assert!(matches!(err, AdapterError::Configuration(_)));
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("provider.yaml");
        std::fs::write(&path, "offline: true\n").unwrap();

        let config = ProviderConfig::load(&path).unwrap();
        assert!(config.offline);
        assert!(ProviderConfig::load(dir.path().join("missing.yaml")).is_err());
    }

    #[tokio::test]
    async fn test_offline_has_no_client() {
        let config = ProviderConfig {
            offline: true,
            ..Default::default()
        };
        let err = config.client().await.err().unwrap();
        assert!(matches!(err, AdapterError::Configuration(_)));
    }

    #[test]
    fn test_resolve_knobs() {
        let defaults = ApplyDefaults {
            field_manager: "platform".to_string(),
            force_conflicts: true,
        };

        let unset = ResourceState::default();
        assert_eq!(
            defaults.resolve(&unset),
            ApplyParams {
                field_manager: "platform".to_string(),
                force: true,
            }
        );

        let own = ResourceState {
            field_manager: Field::Value("team-a".to_string()),
            force_conflicts: Field::Value(false),
            ..Default::default()
        };
        assert_eq!(
            defaults.resolve(&own),
            ApplyParams {
                field_manager: "team-a".to_string(),
                force: false,
            }
        );
    }
}
