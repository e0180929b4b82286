//! Read command - refresh a state file from the cluster

use console::style;
use crdform_kube::ReadRequest;
use std::path::Path;

use super::{GlobalOptions, finish, load_state, write_state};
use crate::error::Result;

pub async fn run(
    options: &GlobalOptions,
    type_name: &str,
    state_path: &Path,
    state_out: Option<&Path>,
) -> Result<()> {
    let state = load_state(state_path)?;
    let provider = options.connected_provider().await?;

    let response = provider
        .read(&ReadRequest {
            type_name: type_name.to_string(),
            state,
        })
        .await;
    finish("read", &response.diagnostics)?;

    match response.state {
        Some(state) => write_state(&state, state_out),
        None => {
            eprintln!(
                "{} {} no longer exists in the cluster",
                style("⚠").yellow(),
                type_name
            );
            Ok(())
        }
    }
}
