//! Implementation of the `cloudmodel build` command.
//!
//! Builds the complete cloud model of a descriptor and prints it as JSON or
//! as a short summary.

use anyhow::{Context, Result};

use cloudmodel_lib::model::CloudModelBuilder;
use cloudmodel_lib::util::hash::Hashable;

use crate::Inputs;
use crate::output::{OutputFormat, print_json, print_stat, print_success, print_warning, truncate_hash};

pub fn cmd_build(inputs: &Inputs, output: OutputFormat) -> Result<()> {
  let loaded = inputs.load()?;
  let model = CloudModelBuilder::new(&loaded.settings.model, &loaded.settings.system)
    .with_deployed(loaded.deployed.as_ref())
    .build(&loaded.descriptor)
    .with_context(|| format!("Failed to build cloud model: {}", inputs.descriptor.display()))?;

  for warning in &model.warnings {
    print_warning(warning);
  }

  if output.is_json() {
    return print_json(&model);
  }

  let hash = model.compute_hash().context("Failed to compute model hash")?;
  print_success(&format!(
    "Built cloud model for {} ({})",
    loaded.descriptor.id,
    truncate_hash(&hash.0)
  ));
  print_stat("Applications", &model.applications.len().to_string());
  print_stat("Services", &model.services.len().to_string());
  print_stat("Service keys", &model.service_keys.len().to_string());
  let entries: usize = model.configuration_entries.values().map(Vec::len).sum();
  print_stat("Configuration entries", &entries.to_string());
  print_stat("Deployment order", &model.deployment_order.modules().join(", "));
  Ok(())
}
