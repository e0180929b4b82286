//! Render command - print the manifest of a configuration without a cluster

use crdform_kube::ReadConfigRequest;
use std::path::{Path, PathBuf};

use super::{GlobalOptions, finish, load_document, write_state};
use crate::error::Result;

pub fn run(
    options: &GlobalOptions,
    type_name: &str,
    files: &[PathBuf],
    set_values: &[String],
    state_out: Option<&Path>,
) -> Result<()> {
    let provider = options.offline_provider()?;
    let config = load_document(files, set_values)?;

    // Resource type names are accepted as well as their manifest names
    let type_name = if type_name.ends_with("_manifest") {
        type_name.to_string()
    } else {
        format!("{}_manifest", type_name)
    };

    let response = provider.read_manifest(&ReadConfigRequest { type_name, config });
    finish("render", &response.diagnostics)?;

    let Some(state) = response.state else {
        return Ok(());
    };
    if let Some(path) = state_out {
        write_state(&state, Some(path))?;
    }
    if let Some(yaml) = state.get("yaml").and_then(|y| y.as_str()) {
        print!("{}", yaml);
    }
    Ok(())
}
