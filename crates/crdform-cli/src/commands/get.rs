//! Get command - look up an existing object as a data source

use crdform_kube::ReadConfigRequest;
use std::path::{Path, PathBuf};

use super::{GlobalOptions, finish, load_document, write_state};
use crate::error::Result;

pub async fn run(
    options: &GlobalOptions,
    type_name: &str,
    files: &[PathBuf],
    set_values: &[String],
    state_out: Option<&Path>,
) -> Result<()> {
    let config = load_document(files, set_values)?;
    let provider = options.connected_provider().await?;

    let response = provider
        .read_data_source(&ReadConfigRequest {
            type_name: type_name.to_string(),
            config,
        })
        .await;
    finish("get", &response.diagnostics)?;

    match response.state {
        Some(state) => write_state(&state, state_out),
        None => Ok(()),
    }
}
