use anyhow::{Context, Result};

use cloudmodel_lib::model::CloudModelBuilder;

use crate::Inputs;
use crate::output::{OutputFormat, print_info, print_json, symbols};

pub fn cmd_names(inputs: &Inputs, output: OutputFormat) -> Result<()> {
  let loaded = inputs.load()?;
  let names = CloudModelBuilder::new(&loaded.settings.model, &loaded.settings.system)
    .service_names(&loaded.descriptor)
    .context("Failed to compute service names")?;

  if output.is_json() {
    return print_json(&names);
  }

  if names.is_empty() {
    print_info("No service resources");
    return Ok(());
  }
  for (resource, name) in &names {
    println!("{} {} {}", resource, symbols::ARROW, name);
  }
  Ok(())
}
