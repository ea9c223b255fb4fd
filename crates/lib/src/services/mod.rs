//! Service specifications from service resources.
//!
//! Every active resource whose type is one of the service kinds becomes at
//! most one [`ServiceSpec`]:
//!
//! | kind                    | required parameters      | result                   |
//! |-------------------------|--------------------------|--------------------------|
//! | `managed-service`       | `service`, `service-plan`| managed service          |
//! | `user-provided-service` |                          | credentials only         |
//! | `existing-service`      |                          | bound only, not managed  |
//! | `existing-service-key`  | `service-name`           | none, injected as a key  |

mod types;

pub use types::*;

use serde_json::Value;
use tracing::{debug, warn};

use crate::consts::*;
use crate::descriptor::{DeploymentDescriptor, Parameters, Resource, ResourceKind};
use crate::error::{ContentError, value_kind};
use crate::naming::ServiceNameMapper;
use crate::params::{ParameterChain, ParameterChainResolver};

/// Builds service specifications for the resources of one descriptor.
#[derive(Debug, Clone, Copy)]
pub struct ServiceModelBuilder<'a> {
  descriptor: &'a DeploymentDescriptor,
  mapper: &'a ServiceNameMapper,
}

impl<'a> ServiceModelBuilder<'a> {
  pub fn new(descriptor: &'a DeploymentDescriptor, mapper: &'a ServiceNameMapper) -> Self {
    Self { descriptor, mapper }
  }

  /// Specifications of all active service resources, in declaration order.
  pub fn build(&self) -> Result<Vec<ServiceSpec>, ContentError> {
    let mut services = Vec::new();
    for resource in &self.descriptor.resources {
      if !resource.active {
        debug!(resource = %resource.name, "skipping inactive resource");
        continue;
      }
      if let Some(service) = self.build_service(resource)? {
        services.push(service);
      }
    }
    Ok(services)
  }

  /// The specification of one resource, or `None` when the resource is not
  /// a service or is an existing service key.
  pub fn build_service(&self, resource: &Resource) -> Result<Option<ServiceSpec>, ContentError> {
    let Some(kind) = resource.service_kind()? else {
      return Ok(None);
    };
    let chain = ParameterChainResolver::new(self.descriptor).for_resource(resource);
    check_required_parameters(resource, kind, &chain)?;
    chain.warn_unsupported(&[SERVICE_PARAMETERS, GLOBAL_PARAMETERS]);

    let name = self.mapper.map_name(resource)?;
    let base = ServiceSpec {
      name: name.clone(),
      resource_name: resource.name.clone(),
      kind,
      label: None,
      plan: None,
      provider: None,
      broker: None,
      version: None,
      alternative_labels: Vec::new(),
      credentials: Parameters::new(),
      tags: Vec::new(),
      syslog_drain_url: None,
      optional: resource.optional || chain.bool_or(OPTIONAL, false)?,
      managed: false,
      ignore_update_errors: chain.bool_or(IGNORE_UPDATE_ERRORS, false)?,
      skip_updates: skip_updates(&chain)?,
    };

    let spec = match kind {
      ResourceKind::ManagedService => ServiceSpec {
        label: chain.get_str(SERVICE)?.map(str::to_string),
        plan: chain.get_str(SERVICE_PLAN)?.map(str::to_string),
        provider: chain.get_str(SERVICE_PROVIDER)?.map(str::to_string),
        broker: chain.get_str(SERVICE_BROKER)?.map(str::to_string),
        version: chain.get_str(SERVICE_VERSION)?.map(str::to_string),
        alternative_labels: chain.get_string_list(SERVICE_ALTERNATIVES)?,
        credentials: service_config(&name, &chain)?,
        tags: chain.get_string_list(SERVICE_TAGS)?,
        managed: true,
        ..base
      },
      ResourceKind::UserProvidedService => {
        if let Some(label) = chain.get_str(SERVICE)? {
          warn!(service = %name, label = %label, "ignoring label of user-provided service");
        }
        ServiceSpec {
          credentials: service_config(&name, &chain)?,
          tags: chain.get_string_list(SERVICE_TAGS)?,
          syslog_drain_url: chain.get_str(SYSLOG_DRAIN_URL)?.map(str::to_string),
          managed: true,
          ..base
        }
      }
      ResourceKind::ExistingService => base,
      ResourceKind::ExistingServiceKey => return Ok(None),
    };

    debug!(resource = %resource.name, service = %spec.name, kind = %kind, "built service");
    Ok(Some(spec))
  }

  /// Service keys declared through `service-keys` on managed and existing
  /// services.
  pub fn build_service_keys(&self) -> Result<Vec<ServiceKeySpec>, ContentError> {
    let mut keys = Vec::new();
    for resource in self.descriptor.resources.iter().filter(|r| r.active) {
      if !matches!(
        resource.service_kind()?,
        Some(ResourceKind::ManagedService | ResourceKind::ExistingService)
      ) {
        continue;
      }
      let chain = ParameterChainResolver::new(self.descriptor).for_resource(resource);
      let Some(entries) = chain.get_list(SERVICE_KEYS)? else {
        continue;
      };
      let service_name = self.mapper.map_name(resource)?;
      for entry in entries {
        keys.push(service_key(&service_name, resource, entry)?);
      }
    }
    Ok(keys)
  }
}

fn check_required_parameters(
  resource: &Resource,
  kind: ResourceKind,
  chain: &ParameterChain<'_>,
) -> Result<(), ContentError> {
  for parameter in kind.required_parameters() {
    if !chain.contains(parameter) {
      return Err(ContentError::MissingParameter {
        resource: resource.name.clone(),
        kind: kind.to_string(),
        parameter: parameter.to_string(),
      });
    }
  }
  Ok(())
}

fn service_config(service: &str, chain: &ParameterChain<'_>) -> Result<Parameters, ContentError> {
  match chain.get(SERVICE_CONFIG) {
    None | Some(Value::Null) => Ok(Parameters::new()),
    Some(Value::Object(map)) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
    Some(other) => Err(ContentError::InvalidServiceConfig {
      service: service.to_string(),
      actual: value_kind(other),
    }),
  }
}

fn skip_updates(chain: &ParameterChain<'_>) -> Result<SkipUpdates, ContentError> {
  let Some(map) = chain.get_map(SKIP_SERVICE_UPDATES)? else {
    return Ok(SkipUpdates::default());
  };
  let flag = |key: &str| -> Result<bool, ContentError> {
    match map.get(key) {
      None | Some(Value::Null) => Ok(false),
      Some(Value::Bool(b)) => Ok(*b),
      Some(_) => Err(ContentError::invalid_type(
        chain.owner(),
        &format!("{SKIP_SERVICE_UPDATES}#{key}"),
        "boolean",
      )),
    }
  };
  Ok(SkipUpdates {
    parameters: flag("parameters")?,
    tags: flag("tags")?,
    plan: flag("plan")?,
    syslog_drain_url: flag(SYSLOG_DRAIN_URL)?,
  })
}

fn service_key(service_name: &str, resource: &Resource, entry: &Value) -> Result<ServiceKeySpec, ContentError> {
  let Value::Object(map) = entry else {
    return Err(ContentError::invalid_type(&resource.name, SERVICE_KEYS, "list of maps"));
  };
  let name = match map.get(ATTR_NAME) {
    Some(Value::String(name)) => name.clone(),
    Some(_) => return Err(ContentError::invalid_type(&resource.name, SERVICE_KEYS, "string key name")),
    None => {
      return Err(ContentError::MissingParameter {
        resource: resource.name.clone(),
        kind: SERVICE_KEYS.to_string(),
        parameter: ATTR_NAME.to_string(),
      });
    }
  };
  let config = match map.get(SERVICE_KEY_CONFIG) {
    None | Some(Value::Null) => Parameters::new(),
    Some(Value::Object(config)) => config.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
    Some(_) => return Err(ContentError::invalid_type(&resource.name, SERVICE_KEYS, "map of key config")),
  };
  Ok(ServiceKeySpec {
    name,
    service_name: service_name.to_string(),
    config,
  })
}
