//! Schema command - describe the attributes of one type

use crdform_core::ResourceMode;

use super::{GlobalOptions, finish};
use crate::display::print_json;
use crate::error::Result;

pub fn run(options: &GlobalOptions, mode: ResourceMode, type_name: &str) -> Result<()> {
    let provider = options.offline_provider()?;
    let response = provider.schema(mode, type_name);
    finish("schema", &response.diagnostics)?;

    match response.schema {
        Some(schema) => print_json(&schema),
        None => Ok(()),
    }
}
