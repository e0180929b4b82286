//! Delete command - remove the object a state file points to

use console::style;
use crdform_kube::DeleteRequest;
use std::path::Path;

use super::{GlobalOptions, finish, load_state};
use crate::error::Result;

pub async fn run(options: &GlobalOptions, type_name: &str, state_path: &Path) -> Result<()> {
    let state = load_state(state_path)?;
    let id = state
        .get("id")
        .and_then(|id| id.as_str())
        .unwrap_or(type_name)
        .to_string();
    let provider = options.connected_provider().await?;

    let response = provider
        .delete(&DeleteRequest {
            type_name: type_name.to_string(),
            state,
        })
        .await;
    finish("delete", &response.diagnostics)?;

    eprintln!("{} Deleted {}", style("✓").green().bold(), style(id).cyan());
    Ok(())
}
