mod build;
mod create_services;
mod k8s;
mod names;

pub use build::cmd_build;
pub use create_services::cmd_create_services;
pub use k8s::cmd_k8s;
pub use names::cmd_names;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use cloudmodel_lib::config::{ModelConfig, SystemParameters};
use cloudmodel_lib::deployed::DeployedMta;
use cloudmodel_lib::descriptor::DeploymentDescriptor;

use crate::Inputs;

/// Contents of the settings file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
  #[serde(default)]
  pub model: ModelConfig,
  pub system: SystemParameters,
}

/// Everything loaded from the command inputs.
pub struct Loaded {
  pub descriptor: DeploymentDescriptor,
  pub settings: Settings,
  pub deployed: Option<DeployedMta>,
}

impl Inputs {
  pub fn load(&self) -> Result<Loaded> {
    let descriptor = DeploymentDescriptor::from_path(&self.descriptor)
      .with_context(|| format!("Failed to load descriptor: {}", self.descriptor.display()))?;
    let settings: Settings = read_yaml(&self.config)?;
    let deployed = self.deployed.as_deref().map(read_yaml::<DeployedMta>).transpose()?;
    debug!(
      mta = %descriptor.id,
      modules = descriptor.modules.len(),
      resources = descriptor.resources.len(),
      deployed = deployed.is_some(),
      "loaded inputs"
    );
    Ok(Loaded {
      descriptor,
      settings,
      deployed,
    })
  }
}

fn read_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
  let content = fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))?;
  serde_yaml::from_str(&content).with_context(|| format!("Failed to parse file: {}", path.display()))
}
