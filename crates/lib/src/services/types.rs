//! Service specification types.

use serde::{Deserialize, Serialize};

use crate::descriptor::{Parameters, ResourceKind};

/// Parts of a service that are left alone when the service already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SkipUpdates {
  pub parameters: bool,
  pub tags: bool,
  pub plan: bool,
  pub syslog_drain_url: bool,
}

/// A service instance the deployment creates, updates or binds to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceSpec {
  /// Platform-visible name, namespaced where configured.
  pub name: String,
  /// The descriptor resource this service comes from.
  pub resource_name: String,
  pub kind: ResourceKind,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub plan: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub provider: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub broker: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub alternative_labels: Vec<String>,
  #[serde(default, skip_serializing_if = "Parameters::is_empty")]
  pub credentials: Parameters,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub tags: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub syslog_drain_url: Option<String>,
  pub optional: bool,
  /// Whether the deployment owns the service. Existing services are only
  /// bound to.
  pub managed: bool,
  pub ignore_update_errors: bool,
  pub skip_updates: SkipUpdates,
}

impl ServiceSpec {
  /// `[label] + alternative labels`, the offerings tried in order when the
  /// service is created.
  pub fn candidate_labels(&self) -> Vec<String> {
    self.label.iter().chain(self.alternative_labels.iter()).cloned().collect()
  }
}

/// A service key to create for a service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceKeySpec {
  pub name: String,
  pub service_name: String,
  #[serde(default, skip_serializing_if = "Parameters::is_empty")]
  pub config: Parameters,
}
