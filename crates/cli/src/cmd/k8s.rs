use anyhow::{Context, Result};

use cloudmodel_lib::k8s::to_yaml;
use cloudmodel_lib::model::CloudModelBuilder;

use crate::Inputs;

pub fn cmd_k8s(inputs: &Inputs) -> Result<()> {
  let loaded = inputs.load()?;
  let manifests = CloudModelBuilder::new(&loaded.settings.model, &loaded.settings.system)
    .build_kubernetes(&loaded.descriptor)
    .with_context(|| format!("Failed to build Kubernetes manifests: {}", inputs.descriptor.display()))?;
  let yaml = to_yaml(&manifests).context("Failed to serialize manifests")?;
  print!("{}", yaml);
  Ok(())
}
