//! The complete cloud model of a descriptor.
//!
//! [`CloudModelBuilder`] injects the system parameters into a copy of the
//! descriptor and runs every model builder over it. The input descriptor is
//! never modified and the same inputs always produce the same model.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::apps::{ApplicationModelBuilder, ApplicationSpec};
use crate::config::{ModelConfig, SystemParameters};
use crate::config_entries::{ConfigurationEntry, ConfigurationEntryModelBuilder};
use crate::consts::*;
use crate::deployed::DeployedMta;
use crate::descriptor::DeploymentDescriptor;
use crate::error::ContentError;
use crate::k8s::{KubernetesResourceSynthesizer, Manifest};
use crate::naming::ServiceNameMapper;
use crate::ordering::{DeploymentOrder, deployment_order};
use crate::params::ParameterChainResolver;
use crate::services::{ServiceKeySpec, ServiceModelBuilder, ServiceSpec};
use crate::util::hash::Hashable;

/// Everything needed to deploy a descriptor to a Cloud Foundry target.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct CloudModel {
  /// Applications in deployment order.
  pub applications: Vec<ApplicationSpec>,
  pub services: Vec<ServiceSpec>,
  pub service_keys: Vec<ServiceKeySpec>,
  /// Configuration entries keyed by module name.
  pub configuration_entries: BTreeMap<String, Vec<ConfigurationEntry>>,
  pub deployment_order: DeploymentOrder,
  /// Unsupported parameters, one message per parameter.
  pub warnings: Vec<String>,
}

impl Hashable for CloudModel {}

/// Compiles descriptors into cloud models for one deployment target.
#[derive(Debug, Clone, Copy)]
pub struct CloudModelBuilder<'a> {
  config: &'a ModelConfig,
  system: &'a SystemParameters,
  deployed: Option<&'a DeployedMta>,
}

impl<'a> CloudModelBuilder<'a> {
  pub fn new(config: &'a ModelConfig, system: &'a SystemParameters) -> Self {
    Self {
      config,
      system,
      deployed: None,
    }
  }

  /// Use the state of a previous deployment.
  pub fn with_deployed(mut self, deployed: Option<&'a DeployedMta>) -> Self {
    self.deployed = deployed;
    self
  }

  /// A copy of `descriptor` with the system parameters injected.
  pub fn prepare(&self, descriptor: &DeploymentDescriptor) -> DeploymentDescriptor {
    let mut prepared = descriptor.clone();
    self.system.inject_into(&mut prepared);
    prepared
  }

  pub fn build(&self, descriptor: &DeploymentDescriptor) -> Result<CloudModel, ContentError> {
    let descriptor = self.prepare(descriptor);
    let placeholders = self.system.placeholder_context();
    let mapper = ServiceNameMapper::from_config(self.config, &descriptor);

    let order = deployment_order(&descriptor)?;
    let services = ServiceModelBuilder::new(&descriptor, &mapper);
    let apps = ApplicationModelBuilder::new(&descriptor, self.config, &placeholders, &mapper).with_deployed(self.deployed);

    let mut applications = Vec::with_capacity(descriptor.modules.len());
    for name in order.modules() {
      if let Some(module) = descriptor.module(name) {
        applications.push(apps.build_application(module)?);
      }
    }

    let model = CloudModel {
      applications,
      services: services.build()?,
      service_keys: services.build_service_keys()?,
      configuration_entries: ConfigurationEntryModelBuilder::new(&descriptor, self.system).build()?,
      deployment_order: order,
      warnings: unsupported_parameters(&descriptor),
    };
    info!(
      mta = %descriptor.id,
      applications = model.applications.len(),
      services = model.services.len(),
      warnings = model.warnings.len(),
      "built cloud model"
    );
    Ok(model)
  }

  /// Kubernetes manifests of `descriptor`.
  pub fn build_kubernetes(&self, descriptor: &DeploymentDescriptor) -> Result<Vec<Manifest>, ContentError> {
    let descriptor = self.prepare(descriptor);
    let placeholders = self.system.placeholder_context();
    KubernetesResourceSynthesizer::new(&descriptor, &placeholders)
      .with_pretty_printing(self.config.pretty_printing)
      .build()
  }

  /// Platform-visible names of the service resources, keyed by resource.
  pub fn service_names(&self, descriptor: &DeploymentDescriptor) -> Result<BTreeMap<String, String>, ContentError> {
    let descriptor = self.prepare(descriptor);
    let mapper = ServiceNameMapper::from_config(self.config, &descriptor);
    let mut names = BTreeMap::new();
    for resource in descriptor.resources.iter().filter(|r| r.active && r.is_service()) {
      names.insert(resource.name.clone(), mapper.map_name(resource)?);
    }
    Ok(names)
  }
}

fn unsupported_parameters(descriptor: &DeploymentDescriptor) -> Vec<String> {
  let resolver = ParameterChainResolver::new(descriptor);
  let modules = descriptor.modules.iter().flat_map(|module| {
    resolver
      .for_module(module)
      .unsupported_keys(&[APP_PARAMETERS, APP_ATTRIBUTES, GLOBAL_PARAMETERS])
      .into_iter()
      .map(|key| format!("unsupported parameter \"{key}\" in module \"{}\"", module.name))
  });
  let resources = descriptor
    .resources
    .iter()
    .filter(|r| r.is_service())
    .flat_map(|resource| {
      resolver
        .for_resource(resource)
        .unsupported_keys(&[SERVICE_PARAMETERS, GLOBAL_PARAMETERS])
        .into_iter()
        .map(|key| format!("unsupported parameter \"{key}\" in resource \"{}\"", resource.name))
    });
  modules.chain(resources).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{SHOP, descriptor, system_parameters};
  use pretty_assertions::assert_eq;
  use serde_json::json;

  fn build(config: &ModelConfig, yaml: &str) -> CloudModel {
    let system = system_parameters();
    CloudModelBuilder::new(config, &system).build(&descriptor(yaml)).unwrap()
  }

  #[test]
  fn shop_model() {
    let model = build(&ModelConfig::default(), SHOP);

    let apps: Vec<&str> = model.applications.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(apps, vec!["web", "backend"]);

    let services: Vec<(&str, bool)> = model.services.iter().map(|s| (s.name.as_str(), s.managed)).collect();
    assert_eq!(services, vec![("db", true), ("creds", true), ("shared", false)]);

    assert_eq!(model.configuration_entries["web"].len(), 1);
    assert_eq!(model.configuration_entries["backend"].len(), 1);
    assert!(model.warnings.is_empty(), "{:?}", model.warnings);
  }

  #[test]
  fn applications_follow_deployment_order() {
    let model = build(
      &ModelConfig::default(),
      r#"
ID: ordered
version: 1.0.0
modules:
  - name: ui
    parameters:
      deployed-after: [api]
  - name: api
"#,
    );
    let apps: Vec<&str> = model.applications.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(apps, vec!["api", "ui"]);
  }

  #[test]
  fn warnings_name_owner() {
    let model = build(
      &ModelConfig::default(),
      r#"
ID: warn
version: 1.0.0
modules:
  - name: web
    parameters:
      colour: blue
resources:
  - name: db
    type: user-provided-service
    parameters:
      flavour: mint
"#,
    );
    assert_eq!(
      model.warnings,
      vec![
        "unsupported parameter \"colour\" in module \"web\"".to_string(),
        "unsupported parameter \"flavour\" in resource \"db\"".to_string(),
      ]
    );
  }

  #[test]
  fn building_is_deterministic_and_pure() {
    let d = descriptor(SHOP);
    let before = d.clone();
    let config = ModelConfig::default();
    let system = system_parameters();
    let builder = CloudModelBuilder::new(&config, &system);

    let first = builder.build(&d).unwrap();
    let second = builder.build(&d).unwrap();
    assert_eq!(d, before);
    assert_eq!(first.compute_hash().unwrap(), second.compute_hash().unwrap());
  }

  #[test]
  fn service_names_respect_namespaces() {
    let config = ModelConfig {
      namespace: Some("team".to_string()),
      use_namespaces: true,
      use_namespaces_for_services: true,
      ..Default::default()
    };
    let system = system_parameters();
    let names = CloudModelBuilder::new(&config, &system)
      .service_names(&descriptor(SHOP))
      .unwrap();
    assert_eq!(names["db"], "team-db");
    assert_eq!(names["shared"], "shared");
  }

  #[test]
  fn keep_existing_routes_uses_deployed_state() {
    let deployed: DeployedMta = serde_json::from_value(json!({
      "metadata": {"id": "com.example.shop", "version": "1.1.0"},
      "applications": [
        {"module-name": "web", "name": "web", "uris": ["legacy.example.com"]}
      ]
    }))
    .unwrap();
    let config = ModelConfig {
      keep_existing_routes: true,
      ..Default::default()
    };
    let system = system_parameters();
    let model = CloudModelBuilder::new(&config, &system)
      .with_deployed(Some(&deployed))
      .build(&descriptor(SHOP))
      .unwrap();
    assert_eq!(
      model.applications[0].uris,
      vec!["acme-dev-web.cfapps.example.com", "legacy.example.com"]
    );
  }
}
