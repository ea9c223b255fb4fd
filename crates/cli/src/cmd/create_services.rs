//! Implementation of the `cloudmodel create-services` command.
//!
//! Builds the service model and creates every managed service on the target
//! cloud controller, trying each offering that carries the requested plan.

use anyhow::{Context, Result};
use tracing::info;

use cloudmodel_lib::model::CloudModelBuilder;
use cloudmodel_lib::orchestrator::ServiceCreationOrchestrator;
use cloudmodel_lib::orchestrator::client::CloudControllerClient;

use crate::Inputs;
use crate::output::{print_info, print_success};

pub fn cmd_create_services(inputs: &Inputs, token: &str) -> Result<()> {
  let loaded = inputs.load()?;
  let system = &loaded.settings.system;
  let space_guid = system
    .space_guid
    .as_deref()
    .context("Setting system.space-guid is required to create services")?;

  let model = CloudModelBuilder::new(&loaded.settings.model, system)
    .build(&loaded.descriptor)
    .with_context(|| format!("Failed to build cloud model: {}", inputs.descriptor.display()))?;

  let client = CloudControllerClient::new(&system.controller_url, token, space_guid)
    .context("Failed to create cloud controller client")?;

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  info!(controller = %system.controller_url, services = model.services.len(), "creating services");
  let created = rt
    .block_on(ServiceCreationOrchestrator::new(&client).create_all(&model.services))
    .context("Failed to create services")?;

  if created.is_empty() {
    print_info("No managed services to create");
    return Ok(());
  }
  for service in &created {
    print_success(&format!("Created {} ({})", service.name, service.label));
  }
  Ok(())
}
