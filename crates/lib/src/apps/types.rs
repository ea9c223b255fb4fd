//! Application specification types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::descriptor::Parameters;
use crate::env::{Environment, RestartParameters};
use crate::routes::ApplicationPort;

/// How the application is staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleType {
  Buildpack,
  Docker,
  Cnb,
}

/// A container image to run instead of staging sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerInfo {
  pub image: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub username: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Staging {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub command: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub buildpacks: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub stack: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub health_check_type: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub health_check_timeout: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub health_check_invocation_timeout: Option<i64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub health_check_http_endpoint: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub ssh_enabled: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub lifecycle: Option<LifecycleType>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub docker: Option<DockerInfo>,
}

/// A one-off task declared on a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Task {
  pub name: String,
  pub command: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub memory: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub disk_quota: Option<u64>,
}

/// Credentials of an existing service key exposed as an environment
/// variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceKeyToInject {
  pub env_var_name: String,
  pub service_name: String,
  pub service_key_name: String,
}

/// Everything needed to push, bind and start one application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApplicationSpec {
  pub name: String,
  pub module_name: String,
  pub staging: Staging,
  /// Megabytes; 0 leaves the platform default.
  pub memory: u64,
  /// Megabytes; 0 leaves the platform default.
  pub disk_quota: u64,
  pub instances: u32,
  pub uris: Vec<String>,
  pub idle_uris: Vec<String>,
  pub domains: Vec<String>,
  pub ports: Vec<ApplicationPort>,
  /// Every service the application is bound to.
  pub services: Vec<String>,
  pub service_keys_to_inject: Vec<ServiceKeyToInject>,
  /// Binding parameters keyed by service name.
  pub binding_parameters: BTreeMap<String, Parameters>,
  pub tasks: Vec<Task>,
  pub restart: RestartParameters,
  pub env: Environment,
}
