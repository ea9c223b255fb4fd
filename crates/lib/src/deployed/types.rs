//! Snapshot of a previously deployed multi-target application.

use serde::{Deserialize, Serialize};

/// What is currently deployed for one multi-target application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeployedMta {
  pub metadata: DeployedMtaMetadata,
  #[serde(default)]
  pub applications: Vec<DeployedMtaApplication>,
  #[serde(default)]
  pub services: Vec<DeployedMtaService>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeployedMtaMetadata {
  pub id: String,
  #[serde(default)]
  pub version: Option<String>,
  #[serde(default)]
  pub namespace: Option<String>,
}

/// Whether an application currently serves traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductizationState {
  #[default]
  Live,
  Idle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeployedMtaApplication {
  pub module_name: String,
  pub name: String,
  #[serde(default)]
  pub uris: Vec<String>,
  #[serde(default)]
  pub bound_services: Vec<String>,
  #[serde(default)]
  pub productization_state: ProductizationState,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeployedMtaService {
  pub name: String,
  #[serde(default)]
  pub resource_name: Option<String>,
  #[serde(default)]
  pub label: Option<String>,
  #[serde(default)]
  pub plan: Option<String>,
}
