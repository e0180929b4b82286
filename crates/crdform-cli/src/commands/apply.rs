//! Apply command - create a resource, or update it from a prior state

use console::style;
use crdform_kube::{CreateRequest, UpdateRequest};
use std::path::{Path, PathBuf};

use super::{GlobalOptions, finish, load_document, load_state, write_state};
use crate::error::Result;

pub struct ApplyArgs<'a> {
    pub type_name: &'a str,
    pub files: &'a [PathBuf],
    pub set_values: &'a [String],
    pub prior_state: Option<&'a Path>,
    pub state_out: Option<&'a Path>,
}

pub async fn run(options: &GlobalOptions, args: ApplyArgs<'_>) -> Result<()> {
    let plan = load_document(args.files, args.set_values)?;
    let prior_state = args.prior_state.map(load_state).transpose()?;
    let provider = options.connected_provider().await?;

    let (operation, response) = match prior_state {
        Some(prior_state) => {
            let request = UpdateRequest {
                type_name: args.type_name.to_string(),
                prior_state,
                plan,
            };
            ("update", provider.update(&request).await)
        }
        None => {
            let request = CreateRequest {
                type_name: args.type_name.to_string(),
                plan,
            };
            ("create", provider.create(&request).await)
        }
    };
    finish(operation, &response.diagnostics)?;

    if let Some(state) = response.state {
        if let Some(id) = state.get("id").and_then(|id| id.as_str()) {
            eprintln!("{} Applied {}", style("✓").green().bold(), style(id).cyan());
        }
        write_state(&state, args.state_out)?;
    }
    Ok(())
}
