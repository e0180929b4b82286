//! Validate command - check configuration against a type's schema

use console::style;
use crdform_core::ResourceMode;
use crdform_kube::ValidateRequest;
use std::path::PathBuf;

use super::{GlobalOptions, load_document};
use crate::display::{print_diagnostics, print_json, print_validation_summary, summary};
use crate::error::{CliError, Result};

pub fn run(
    options: &GlobalOptions,
    mode: ResourceMode,
    type_name: &str,
    files: &[PathBuf],
    set_values: &[String],
    json_output: bool,
) -> Result<()> {
    let provider = options.offline_provider()?;
    let config = load_document(files, set_values)?;

    if !json_output {
        eprintln!(
            "{} Validating {} {}",
            style("→").blue(),
            mode,
            style(type_name).cyan()
        );
    }

    let response = provider.validate(&ValidateRequest {
        type_name: type_name.to_string(),
        mode,
        config,
    });
    let (errors, _) = summary(&response.diagnostics);

    if json_output {
        print_json(&serde_json::json!({
            "valid": errors == 0,
            "type_name": type_name,
            "diagnostics": response.diagnostics,
        }))?;
    } else {
        print_diagnostics(&response.diagnostics);
        print_validation_summary(&response.diagnostics);
    }

    if errors > 0 {
        Err(CliError::validation(errors))
    } else {
        Ok(())
    }
}
