//! CLI commands

pub mod apply;
pub mod delete;
pub mod get;
pub mod import;
pub mod read;
pub mod render;
pub mod schema;
pub mod types;
pub mod validate;

use std::path::{Path, PathBuf};

use crdform_core::{Document, Registry, parse_set_values};
use crdform_kube::{Diagnostics, Provider, ProviderConfig};
use miette::{IntoDiagnostic, WrapErr};
use serde_json::Value as JsonValue;

use crate::display::{print_diagnostics, print_json, summary};
use crate::error::{CliError, Result};

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub crds: Vec<PathBuf>,
    pub offline: bool,
}

impl GlobalOptions {
    /// Bundled CRDs plus any `--crds` files
    pub fn registry(&self) -> Result<Registry> {
        let mut registry = Registry::bundled()?;
        for path in &self.crds {
            registry.add_crd_file(path).map_err(|e| {
                CliError::config_with_help(
                    format!("failed to load CRDs from {}: {}", path.display(), e),
                    "CRD files must be apiextensions.k8s.io/v1 CustomResourceDefinitions",
                )
            })?;
        }
        Ok(registry)
    }

    pub fn provider_config(&self) -> Result<ProviderConfig> {
        let mut config = match &self.config {
            Some(path) => ProviderConfig::load(path)?,
            None => ProviderConfig::load_default()?,
        };
        if self.offline {
            config.offline = true;
        }
        Ok(config)
    }

    /// Provider for commands that never reach the cluster
    pub fn offline_provider(&self) -> Result<Provider> {
        Ok(Provider::new(self.registry()?))
    }

    /// Provider connected to the configured cluster
    pub async fn connected_provider(&self) -> Result<Provider> {
        let config = self.provider_config()?;
        let mut provider = self.offline_provider()?;
        let response = provider.configure(&config).await;
        finish("configure", &response.diagnostics)?;
        Ok(provider)
    }
}

/// Merge input files in order, then `--set` overrides
pub fn load_document(files: &[PathBuf], set_values: &[String]) -> Result<JsonValue> {
    let mut document = Document::new();
    for file in files {
        document.merge(&Document::from_file(file)?);
    }
    if !set_values.is_empty() {
        document.merge(&parse_set_values(set_values)?);
    }
    Ok(document.into_inner())
}

/// Read a state file written by a previous command
pub fn load_state(path: &Path) -> Result<JsonValue> {
    Ok(Document::from_file(path)?.into_inner())
}

/// Print diagnostics and fail if any of them is an error
pub fn finish(operation: &str, diagnostics: &Diagnostics) -> Result<()> {
    print_diagnostics(diagnostics);
    let (errors, _) = summary(diagnostics);
    if errors > 0 {
        Err(CliError::operation(operation, errors))
    } else {
        Ok(())
    }
}

/// Write state to `out`, or stdout when no file is given
pub fn write_state(state: &JsonValue, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, serde_json::to_string_pretty(state)? + "\n")
                .into_diagnostic()
                .wrap_err_with(|| format!("failed to write state to {}", path.display()))?;
            tracing::debug!(path = %path.display(), "wrote state");
            Ok(())
        }
        None => print_json(state),
    }
}
