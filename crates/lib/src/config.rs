//! Build configuration and injected system parameters.
//!
//! [`ModelConfig`] holds the switches that shape the computed model (target
//! platform flavour, namespacing, routing). [`SystemParameters`] holds the
//! values known only for a concrete deployment target, which are written into
//! the descriptor as defaults before any model is built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::consts::*;
use crate::descriptor::{DeploymentDescriptor, Parameters};
use crate::placeholder::PlaceholderContext;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";
const MAX_HOST_LENGTH: usize = 63;

/// Flavour of the target platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformType {
  #[default]
  Cf,
  Xs2,
}

impl PlatformType {
  /// Whether emitted URIs carry the scheme (`https://host.domain`).
  pub fn includes_protocol(&self) -> bool {
    matches!(self, PlatformType::Xs2)
  }
}

/// Switches that shape the computed cloud model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ModelConfig {
  pub platform_type: PlatformType,
  /// Namespace for computed names. Defaults to the descriptor id.
  pub namespace: Option<String>,
  pub port_based_routing: bool,
  pub pretty_printing: bool,
  pub use_namespaces: bool,
  pub use_namespaces_for_services: bool,
  pub namespace_as_suffix: bool,
  /// Global update strategy: keep the routes of the deployed application.
  pub keep_existing_routes: bool,
  pub deploy_id: Option<String>,
}

impl ModelConfig {
  /// The effective namespace for a descriptor.
  pub fn namespace_for<'a>(&'a self, descriptor: &'a DeploymentDescriptor) -> &'a str {
    self.namespace.as_deref().unwrap_or(&descriptor.id)
  }
}

/// Values of the deployment target injected into every descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SystemParameters {
  pub org: String,
  pub space: String,
  #[serde(default)]
  pub org_guid: Option<String>,
  #[serde(default)]
  pub space_guid: Option<String>,
  #[serde(default)]
  pub user: Option<String>,
  pub default_domain: String,
  #[serde(default)]
  pub default_idle_domain: Option<String>,
  pub controller_url: String,
  #[serde(default)]
  pub authorization_endpoint: Option<String>,
  #[serde(default)]
  pub deploy_service_url: Option<String>,
  /// Route protocol; defaults to the scheme of the controller URL.
  #[serde(default)]
  pub protocol: Option<String>,
  #[serde(default)]
  pub router_port: Option<u16>,
  #[serde(default = "Utc::now")]
  pub timestamp: DateTime<Utc>,
}

impl SystemParameters {
  pub fn new(
    org: impl Into<String>,
    space: impl Into<String>,
    default_domain: impl Into<String>,
    controller_url: impl Into<String>,
  ) -> Self {
    Self {
      org: org.into(),
      space: space.into(),
      org_guid: None,
      space_guid: None,
      user: None,
      default_domain: default_domain.into(),
      default_idle_domain: None,
      controller_url: controller_url.into(),
      authorization_endpoint: None,
      deploy_service_url: None,
      protocol: None,
      router_port: None,
      timestamp: Utc::now(),
    }
  }

  /// The route protocol: explicit, else the controller URL scheme, else https.
  pub fn protocol(&self) -> &str {
    if let Some(protocol) = &self.protocol {
      return protocol;
    }
    match self.controller_url.split_once("://") {
      Some((scheme, _)) if !scheme.is_empty() => scheme,
      _ => "https",
    }
  }

  pub fn timestamp_string(&self) -> String {
    self.timestamp.format(TIMESTAMP_FORMAT).to_string()
  }

  /// The default host of a module: `<org>-<space>-<module>`, made host-safe.
  pub fn default_host(&self, module_name: &str) -> String {
    sanitize_host(&format!("{} {} {}", self.org, self.space, module_name))
  }

  /// Write system values into the descriptor.
  ///
  /// Only keys the descriptor does not set already are written, so every
  /// value here is a default the author can override.
  pub fn inject_into(&self, descriptor: &mut DeploymentDescriptor) {
    debug!(mta = %descriptor.id, org = %self.org, space = %self.space, "injecting system parameters");

    let mut general = vec![
      (ORG, json!(self.org)),
      (SPACE, json!(self.space)),
      (DEFAULT_DOMAIN, json!(self.default_domain)),
      (CONTROLLER_URL, json!(self.controller_url)),
      (PROTOCOL, json!(self.protocol())),
      (TIMESTAMP, json!(self.timestamp_string())),
    ];
    if let Some(user) = &self.user {
      general.push((USER, json!(user)));
    }
    if let Some(idle) = &self.default_idle_domain {
      general.push((DEFAULT_IDLE_DOMAIN, json!(idle)));
    }
    if let Some(url) = &self.authorization_endpoint {
      general.push((AUTHORIZATION_URL, json!(url)));
    }
    if let Some(url) = &self.deploy_service_url {
      general.push((DEPLOY_SERVICE_URL, json!(url)));
    }
    put_defaults(&mut descriptor.parameters, general);

    for module in &mut descriptor.modules {
      let defaults = vec![
        (DEFAULT_APP_NAME, json!(module.name)),
        (DEFAULT_HOST, json!(self.default_host(&module.name))),
        (
          DEFAULT_IDLE_HOST,
          json!(self.default_host(&format!("{}{IDLE_SUFFIX}", module.name))),
        ),
        (DEFAULT_INSTANCES, json!(1)),
      ];
      put_defaults(&mut module.parameters, defaults);
    }

    for resource in &mut descriptor.resources {
      put_defaults(
        &mut resource.parameters,
        vec![(DEFAULT_SERVICE_NAME, json!(resource.name))],
      );
    }
  }

  /// Placeholder values for this target.
  pub fn placeholder_context(&self) -> PlaceholderContext {
    PlaceholderContext {
      default_domain: Some(self.default_domain.clone()),
      default_idle_domain: self.default_idle_domain.clone(),
      protocol: Some(self.protocol().to_string()),
      authorization_endpoint: self.authorization_endpoint.clone(),
      deploy_service_url: self.deploy_service_url.clone(),
      controller_endpoint: Some(self.controller_url.clone()),
      router_port: self.router_port.map(|p| p.to_string()),
    }
  }
}

fn put_defaults(scope: &mut Parameters, defaults: Vec<(&str, Value)>) {
  for (key, value) in defaults {
    scope.entry(key.to_string()).or_insert(value);
  }
}

/// Turn arbitrary text into a valid host label.
///
/// Lowercases, replaces anything outside `[a-z0-9-]` with `-`, trims dashes
/// from both ends and truncates to the host label limit.
pub fn sanitize_host(input: &str) -> String {
  let replaced: String = input
    .to_lowercase()
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
    .collect();
  let truncated: String = replaced.trim_matches('-').chars().take(MAX_HOST_LENGTH).collect();
  truncated.trim_end_matches('-').to_string()
}
