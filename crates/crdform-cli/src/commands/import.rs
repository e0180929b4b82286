//! Import command - adopt an existing object by its id

use crdform_kube::{ImportStateRequest, ReadRequest};
use std::path::Path;

use super::{GlobalOptions, finish, write_state};
use crate::error::{CliError, Result};

/// Seed state from `id`, then read the live object into it
pub async fn run(
    options: &GlobalOptions,
    type_name: &str,
    id: &str,
    state_out: Option<&Path>,
) -> Result<()> {
    let provider = options.connected_provider().await?;

    let seeded = provider.import_state(&ImportStateRequest {
        type_name: type_name.to_string(),
        id: id.to_string(),
    });
    finish("import", &seeded.diagnostics)?;
    let Some(state) = seeded.state else {
        return Ok(());
    };

    let response = provider
        .read(&ReadRequest {
            type_name: type_name.to_string(),
            state,
        })
        .await;
    finish("import", &response.diagnostics)?;

    match response.state {
        Some(state) => write_state(&state, state_out),
        None => Err(CliError::Operation {
            operation: format!("import of '{}'", id),
            errors: 1,
        }),
    }
}
