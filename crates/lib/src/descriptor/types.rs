//! Deployment descriptor types.
//!
//! The descriptor is the parsed, version-agnostic form of a multi-target
//! application: global parameters, deployable modules and the resources they
//! depend on. It is read-only input to every model builder in this crate.
//!
//! # Parameters and properties
//!
//! Parameters steer how the model is built (`memory`, `service-plan`, ...).
//! Properties are opaque user data copied into application environments and
//! configuration entries. Both are ordered maps of JSON values so that every
//! computation over them is deterministic.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One parameter or property scope.
pub type Parameters = BTreeMap<String, Value>;

/// The complete deployment descriptor of a multi-target application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeploymentDescriptor {
  #[serde(rename = "ID", alias = "id")]
  pub id: String,
  pub version: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub provider: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub copyright: Option<String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub parameters: Parameters,
  #[serde(default)]
  pub modules: Vec<Module>,
  #[serde(default)]
  pub resources: Vec<Resource>,
}

/// A deployable unit: one application or one cluster workload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
  pub name: String,
  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub module_type: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub path: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub parameters: Parameters,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub properties: Parameters,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub requires: Vec<RequiredDependency>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub provides: Vec<ProvidedDependency>,
}

/// A reference from a module to a resource or to another module's provided
/// dependency, carrying its own parameter and property scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequiredDependency {
  pub name: String,
  #[serde(
    default,
    deserialize_with = "one_or_many",
    skip_serializing_if = "Vec::is_empty"
  )]
  pub group: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub list: Option<String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub parameters: Parameters,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub properties: Parameters,
}

impl RequiredDependency {
  /// Environment groups this dependency is rendered into.
  ///
  /// `list` takes precedence over `group`. An empty result means the
  /// dependency's properties are flattened into the environment.
  pub fn destination_groups(&self) -> Vec<String> {
    match &self.list {
      Some(list) => vec![list.clone()],
      None => self.group.clone(),
    }
  }
}

/// A named contract a module offers to other modules or packages.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProvidedDependency {
  pub name: String,
  #[serde(default)]
  pub public: bool,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub parameters: Parameters,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub properties: Parameters,
}

/// A declared dependency of the package, usually a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
  pub name: String,
  #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
  pub resource_type: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub parameters: Parameters,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub properties: Parameters,
  #[serde(default)]
  pub optional: bool,
  #[serde(default = "default_active")]
  pub active: bool,
}

impl Default for Resource {
  fn default() -> Self {
    Self {
      name: String::new(),
      resource_type: None,
      description: None,
      parameters: Parameters::new(),
      properties: Parameters::new(),
      optional: false,
      active: true,
    }
  }
}

fn default_active() -> bool {
  true
}

/// The closed set of service resource kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
  ManagedService,
  UserProvidedService,
  ExistingService,
  ExistingServiceKey,
}

impl ResourceKind {
  const PLATFORM_PREFIX: &'static str = "org.cloudfoundry.";

  pub fn as_str(&self) -> &'static str {
    match self {
      ResourceKind::ManagedService => "managed-service",
      ResourceKind::UserProvidedService => "user-provided-service",
      ResourceKind::ExistingService => "existing-service",
      ResourceKind::ExistingServiceKey => "existing-service-key",
    }
  }

  /// Parameters a resource of this kind must declare.
  pub fn required_parameters(&self) -> &'static [&'static str] {
    use crate::consts::{SERVICE, SERVICE_NAME, SERVICE_PLAN};
    match self {
      ResourceKind::ManagedService => &[SERVICE, SERVICE_PLAN],
      ResourceKind::UserProvidedService => &[],
      ResourceKind::ExistingService => &[],
      ResourceKind::ExistingServiceKey => &[SERVICE_NAME],
    }
  }
}

impl fmt::Display for ResourceKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ResourceKind {
  type Err = String;

  /// Accepts both the short form (`managed-service`) and the platform
  /// qualified form (`org.cloudfoundry.managed-service`).
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let short = s.strip_prefix(Self::PLATFORM_PREFIX).unwrap_or(s);
    match short {
      "managed-service" => Ok(ResourceKind::ManagedService),
      "user-provided-service" => Ok(ResourceKind::UserProvidedService),
      "existing-service" => Ok(ResourceKind::ExistingService),
      "existing-service-key" => Ok(ResourceKind::ExistingServiceKey),
      _ => Err(s.to_string()),
    }
  }
}

/// Accept either a single string or a list of strings.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum OneOrMany {
    One(String),
    Many(Vec<String>),
  }

  Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
    None => Vec::new(),
    Some(OneOrMany::One(value)) => vec![value],
    Some(OneOrMany::Many(values)) => values,
  })
}
