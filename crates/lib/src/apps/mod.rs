//! Application specifications from modules.
//!
//! One [`ApplicationSpec`] per module: name, staging, sizing, routes, bound
//! services and the environment. The heavy lifting is delegated to the route,
//! environment and naming builders; this module stitches their results
//! together and resolves the module's required dependencies to services.

pub mod staging;
mod types;

pub use types::*;

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info};

use crate::config::ModelConfig;
use crate::consts::*;
use crate::deployed::DeployedMta;
use crate::descriptor::{DeploymentDescriptor, Module, Parameters, RequiredDependency, Resource, ResourceKind};
use crate::env::EnvironmentModelBuilder;
use crate::error::{ContentError, value_kind};
use crate::naming::{ServiceNameMapper, application_name};
use crate::params::{ParameterChain, ParameterChainResolver};
use crate::placeholder::PlaceholderContext;
use crate::routes::RouteModelBuilder;
use crate::util::dedup_stable;
use crate::util::size::parse_megabytes;

/// Builds application specifications for the modules of one descriptor.
#[derive(Debug, Clone, Copy)]
pub struct ApplicationModelBuilder<'a> {
  descriptor: &'a DeploymentDescriptor,
  config: &'a ModelConfig,
  placeholders: &'a PlaceholderContext,
  mapper: &'a ServiceNameMapper,
  deployed: Option<&'a DeployedMta>,
}

impl<'a> ApplicationModelBuilder<'a> {
  pub fn new(
    descriptor: &'a DeploymentDescriptor,
    config: &'a ModelConfig,
    placeholders: &'a PlaceholderContext,
    mapper: &'a ServiceNameMapper,
  ) -> Self {
    Self {
      descriptor,
      config,
      placeholders,
      mapper,
      deployed: None,
    }
  }

  /// Use previously deployed state, needed for `keep-existing-routes`.
  pub fn with_deployed(mut self, deployed: Option<&'a DeployedMta>) -> Self {
    self.deployed = deployed;
    self
  }

  /// Specifications of all modules, in declaration order.
  pub fn build(&self) -> Result<Vec<ApplicationSpec>, ContentError> {
    self
      .descriptor
      .modules
      .iter()
      .map(|module| self.build_application(module))
      .collect()
  }

  pub fn build_application(&self, module: &Module) -> Result<ApplicationSpec, ContentError> {
    let chain = ParameterChainResolver::new(self.descriptor).for_module(module);
    chain.warn_unsupported(&[APP_PARAMETERS, APP_ATTRIBUTES, GLOBAL_PARAMETERS]);

    let routes = RouteModelBuilder::new(self.config, self.placeholders).with_deployed(self.deployed);
    let env_builder = EnvironmentModelBuilder::new(self.descriptor, self.placeholders, self.config.deploy_id.as_deref());

    let services = self.all_services(module)?;
    let env = env_builder.build(module, &self.creatable_services(module)?)?;

    let spec = ApplicationSpec {
      name: application_name(module, &chain, self.config, self.descriptor)?,
      module_name: module.name.clone(),
      staging: staging::parse_staging(&chain)?,
      memory: megabytes(&chain, MEMORY)?.unwrap_or(0),
      disk_quota: megabytes(&chain, DISK_QUOTA)?.unwrap_or(0),
      instances: instances(&chain)?,
      uris: routes.uris(module, &chain)?,
      idle_uris: routes.idle_uris(&chain)?,
      domains: routes.domains(&chain)?,
      ports: routes.ports(&chain)?,
      services,
      service_keys_to_inject: self.service_keys_to_inject(module)?,
      binding_parameters: self.binding_parameters(module)?,
      tasks: tasks(&chain)?,
      restart: env_builder.restart_parameters(&chain)?,
      env,
    };

    info!(
      module = %module.name,
      app = %spec.name,
      services = spec.services.len(),
      uris = spec.uris.len(),
      "built application"
    );
    Ok(spec)
  }

  /// Names of every service the module binds, existing services included.
  pub fn all_services(&self, module: &Module) -> Result<Vec<String>, ContentError> {
    self.service_names(module, |_| true)
  }

  /// Names of the bound services this deployment creates or updates.
  pub fn creatable_services(&self, module: &Module) -> Result<Vec<String>, ContentError> {
    self.service_names(module, |kind| kind != ResourceKind::ExistingService)
  }

  fn service_names(&self, module: &Module, include: impl Fn(ResourceKind) -> bool) -> Result<Vec<String>, ContentError> {
    let mut names = Vec::new();
    for (_, resource, kind) in self.required_services(module)? {
      if include(kind) {
        names.push(self.mapper.map_name(resource)?);
      }
    }
    Ok(dedup_stable(names))
  }

  /// Required dependencies of a module that resolve to active, bindable
  /// service resources.
  fn required_services<'m>(
    &self,
    module: &'m Module,
  ) -> Result<Vec<(&'m RequiredDependency, &'a Resource, ResourceKind)>, ContentError> {
    let mut found = Vec::new();
    for dependency in &module.requires {
      let Some(resource) = self.active_resource(&dependency.name) else {
        continue;
      };
      match resource.service_kind()? {
        Some(ResourceKind::ExistingServiceKey) | None => {}
        Some(kind) => found.push((dependency, resource, kind)),
      }
    }
    Ok(found)
  }

  fn active_resource(&self, name: &str) -> Option<&'a Resource> {
    self.descriptor.resource(name).filter(|r| r.active)
  }

  /// Binding parameters from the `config` parameter of service dependencies,
  /// keyed by service name.
  pub fn binding_parameters(&self, module: &Module) -> Result<BTreeMap<String, Parameters>, ContentError> {
    let mut result = BTreeMap::new();
    for (dependency, resource, _) in self.required_services(module)? {
      let Some(value) = dependency.parameters.get(BINDING_PARAMETERS) else {
        continue;
      };
      let Value::Object(map) = value else {
        return Err(ContentError::InvalidBindingParameters {
          module: module.name.clone(),
          dependency: dependency.name.clone(),
          actual: value_kind(value),
        });
      };
      let parameters: Parameters = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
      result.insert(self.mapper.map_name(resource)?, parameters);
    }
    Ok(result)
  }

  /// Existing service keys the module requires, exposed as environment
  /// variables.
  pub fn service_keys_to_inject(&self, module: &Module) -> Result<Vec<ServiceKeyToInject>, ContentError> {
    let resolver = ParameterChainResolver::new(self.descriptor);
    let mut keys = Vec::new();
    for dependency in &module.requires {
      let Some(resource) = self.active_resource(&dependency.name) else {
        continue;
      };
      if resource.service_kind()? != Some(ResourceKind::ExistingServiceKey) {
        continue;
      }
      let chain = resolver.for_resource(resource);
      let Some(service_name) = chain.get_str(SERVICE_NAME)? else {
        return Err(ContentError::MissingParameter {
          resource: resource.name.clone(),
          kind: ResourceKind::ExistingServiceKey.to_string(),
          parameter: SERVICE_NAME.to_string(),
        });
      };
      let key_name = chain.get_str(SERVICE_KEY_NAME)?.unwrap_or(&resource.name).to_string();
      let env_var_name = ParameterChain::new(format!("{}#{}", module.name, dependency.name), vec![&dependency.parameters])
        .get_str(ENV_VAR_NAME)?
        .map(str::to_string)
        .unwrap_or_else(|| key_name.clone());
      debug!(module = %module.name, key = %key_name, env = %env_var_name, "injecting service key");
      keys.push(ServiceKeyToInject {
        env_var_name,
        service_name: service_name.to_string(),
        service_key_name: key_name,
      });
    }
    Ok(keys)
  }
}

fn megabytes(chain: &ParameterChain<'_>, key: &str) -> Result<Option<u64>, ContentError> {
  chain
    .get(key)
    .map(|value| parse_megabytes(&format!("{}#{key}", chain.owner()), value))
    .transpose()
}

fn instances(chain: &ParameterChain<'_>) -> Result<u32, ContentError> {
  let (key, value) = match chain.get_i64(INSTANCES)? {
    Some(value) => (INSTANCES, value),
    None => (DEFAULT_INSTANCES, chain.get_i64(DEFAULT_INSTANCES)?.unwrap_or(0)),
  };
  u32::try_from(value).map_err(|_| ContentError::invalid_type(chain.owner(), key, "non-negative integer"))
}

fn tasks(chain: &ParameterChain<'_>) -> Result<Vec<Task>, ContentError> {
  let Some(entries) = chain.get_list(TASKS)? else {
    return Ok(Vec::new());
  };
  let owner = chain.owner();
  entries
    .iter()
    .map(|entry| {
      let Value::Object(map) = entry else {
        return Err(ContentError::invalid_type(owner, TASKS, "list of maps"));
      };
      let text = |key: &str| match map.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        _ => Err(ContentError::invalid_type(owner, &format!("{TASKS}#{key}"), "string")),
      };
      let size = |key: &str| {
        map
          .get(key)
          .map(|value| parse_megabytes(&format!("{owner}#{TASKS}#{key}"), value))
          .transpose()
      };
      Ok(Task {
        name: text("name")?,
        command: text(COMMAND)?,
        memory: size(MEMORY)?,
        disk_quota: size(DISK_QUOTA)?,
      })
    })
    .collect()
}
