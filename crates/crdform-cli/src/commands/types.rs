//! Types command - list the generated type names

use super::GlobalOptions;
use crate::display::{print_json, print_types};
use crate::error::Result;

pub fn run(options: &GlobalOptions, json: bool) -> Result<()> {
    let provider = options.offline_provider()?;
    let listing = provider.resource_types();

    if json {
        print_json(&listing)
    } else {
        print_types(&listing);
        Ok(())
    }
}
