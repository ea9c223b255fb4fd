//! Kubernetes manifests from a descriptor.
//!
//! Modules become workloads according to their `type` parameter:
//!
//! | type         | manifests                                            |
//! |--------------|------------------------------------------------------|
//! | `deployment` | ConfigMap, Deployment, Service, Ingress (with route) |
//! | `job`        | ConfigMap, Job                                       |
//!
//! Resources become `docker-secret` pull secrets, opaque `secret`s or
//! `service-instance`s with a paired binding. Every manifest of a module
//! carries the same `app`, `mta` and `release` labels, and selectors match on
//! `app`.

mod types;

pub use types::*;

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::consts::*;
use crate::descriptor::{DeploymentDescriptor, Module, Parameters, Resource};
use crate::env::EnvironmentModelBuilder;
use crate::error::{ContentError, value_kind};
use crate::params::{ParameterChain, ParameterChainResolver};
use crate::placeholder::{PlaceholderContext, substitute};
use crate::routes::uri;
use crate::util::dedup_stable;
use crate::util::hash::Hashable;

const MODULE_DEPLOYMENT: &str = "deployment";
const MODULE_JOB: &str = "job";
const RESOURCE_DOCKER_SECRET: &str = "docker-secret";
const RESOURCE_SECRET: &str = "secret";
const RESOURCE_SERVICE_INSTANCE: &str = "service-instance";

const LABEL_APP: &str = "app";
const LABEL_MTA: &str = "mta";
const LABEL_RELEASE: &str = "release";
const CONFIG_CHECKSUM_ANNOTATION: &str = "mta/config-checksum";

const API_V1: &str = "v1";
const API_APPS: &str = "apps/v1";
const API_BATCH: &str = "batch/v1";
const API_NETWORKING: &str = "networking.k8s.io/v1";
const API_SERVICE_CATALOG: &str = "servicecatalog.k8s.io/v1beta1";

const STRATEGY: &str = "RollingUpdate";
const MAX_SURGE: u32 = 1;
const MAX_UNAVAILABLE: u32 = 1;
const REVISION_HISTORY_LIMIT: u32 = 10;
const PROGRESS_DEADLINE_SECONDS: u32 = 600;
const RESTART_ALWAYS: &str = "Always";
const RESTART_NEVER: &str = "Never";
const DNS_POLICY: &str = "ClusterFirst";
const SCHEDULER_NAME: &str = "default-scheduler";
const TERMINATION_GRACE_PERIOD_SECONDS: u64 = 30;
const TERMINATION_MESSAGE_PATH: &str = "/dev/termination-log";
const TERMINATION_MESSAGE_POLICY: &str = "File";
const IMAGE_PULL_POLICY: &str = "Always";
const DEFAULT_CONTAINER_PORT: u16 = 8080;
const PROTOCOL_TCP: &str = "TCP";
const SERVICE_TYPE: &str = "ClusterIP";
const SERVICE_PORT: u16 = 80;
const INGRESS_PATH: &str = "/";
const INGRESS_PATH_TYPE: &str = "Prefix";
const SECRET_OPAQUE: &str = "Opaque";
const SECRET_DOCKER_CONFIG: &str = "kubernetes.io/dockerconfigjson";
const DOCKER_CONFIG_KEY: &str = ".dockerconfigjson";
const BINDING_SUFFIX: &str = "-binding";

/// Builds Kubernetes manifests for one descriptor.
#[derive(Debug, Clone, Copy)]
pub struct KubernetesResourceSynthesizer<'a> {
  descriptor: &'a DeploymentDescriptor,
  placeholders: &'a PlaceholderContext,
  pretty: bool,
}

impl<'a> KubernetesResourceSynthesizer<'a> {
  pub fn new(descriptor: &'a DeploymentDescriptor, placeholders: &'a PlaceholderContext) -> Self {
    Self {
      descriptor,
      placeholders,
      pretty: false,
    }
  }

  /// Render structured ConfigMap values indented.
  pub fn with_pretty_printing(mut self, pretty: bool) -> Self {
    self.pretty = pretty;
    self
  }

  /// Manifests of all modules followed by those of all active resources.
  pub fn build(&self) -> Result<Vec<Manifest>, ContentError> {
    let mut manifests = Vec::new();
    for module in &self.descriptor.modules {
      manifests.extend(self.build_module(module)?);
    }
    for resource in self.descriptor.resources.iter().filter(|r| r.active) {
      manifests.extend(self.build_resource(resource)?);
    }
    info!(mta = %self.descriptor.id, count = manifests.len(), "synthesized manifests");
    Ok(manifests)
  }

  pub fn build_module(&self, module: &Module) -> Result<Vec<Manifest>, ContentError> {
    let chain = ParameterChainResolver::new(self.descriptor).for_module(module);
    let module_type = chain.get_str(TYPE)?.unwrap_or(MODULE_DEPLOYMENT);
    let labels = self.labels(&module.name);
    let config_map = self.config_map(module, &labels)?;

    let manifests = match module_type {
      MODULE_DEPLOYMENT => {
        let port = container_port(&chain)?;
        let mut manifests = vec![
          Manifest::Deployment(self.deployment(module, &chain, &labels, &config_map, port)?),
          Manifest::Service(service(module, &labels, port)),
        ];
        if let Some(ingress) = self.ingress(module, &chain, &labels)? {
          manifests.push(Manifest::Ingress(ingress));
        }
        manifests.insert(0, Manifest::ConfigMap(config_map));
        manifests
      }
      MODULE_JOB => {
        let job = self.job(module, &chain, &labels, &config_map)?;
        vec![Manifest::ConfigMap(config_map), Manifest::Job(job)]
      }
      other => {
        return Err(ContentError::UnknownModuleType {
          module: module.name.clone(),
          value: other.to_string(),
        });
      }
    };
    debug!(module = %module.name, kind = %module_type, count = manifests.len(), "built module manifests");
    Ok(manifests)
  }

  /// Manifests of one resource. Resources without a type produce none.
  pub fn build_resource(&self, resource: &Resource) -> Result<Vec<Manifest>, ContentError> {
    let Some(resource_type) = resource.declared_type()? else {
      debug!(resource = %resource.name, "resource without type, nothing to synthesize");
      return Ok(Vec::new());
    };
    let chain = ParameterChainResolver::new(self.descriptor).for_resource(resource);
    let labels = self.labels(&resource.name);

    match resource_type {
      RESOURCE_DOCKER_SECRET => Ok(vec![Manifest::Secret(docker_secret(resource, &chain, labels)?)]),
      RESOURCE_SECRET => Ok(vec![Manifest::Secret(opaque_secret(resource, labels)?)]),
      RESOURCE_SERVICE_INSTANCE => {
        let (instance, binding) = service_instance(resource, &chain, labels)?;
        Ok(vec![Manifest::ServiceInstance(instance), Manifest::ServiceBinding(binding)])
      }
      other => Err(ContentError::UnknownResourceType {
        resource: resource.name.clone(),
        value: other.to_string(),
      }),
    }
  }

  fn labels(&self, app: &str) -> Labels {
    [
      (LABEL_APP, app),
      (LABEL_MTA, self.descriptor.id.as_str()),
      (LABEL_RELEASE, self.descriptor.version.as_str()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
  }

  fn config_map(&self, module: &Module, labels: &Labels) -> Result<ConfigMap, ContentError> {
    let services = self.required_of_type(module, RESOURCE_SERVICE_INSTANCE);
    let env = EnvironmentModelBuilder::new(self.descriptor, self.placeholders, None).build(module, &services)?;
    Ok(ConfigMap {
      api_version: API_V1.to_string(),
      metadata: ObjectMeta::new(&module.name, labels.clone()),
      data: env.to_env_strings(self.pretty),
    })
  }

  /// Names of the active resources of `resource_type` the module requires.
  fn required_of_type(&self, module: &Module, resource_type: &str) -> Vec<String> {
    module
      .requires
      .iter()
      .filter_map(|d| self.descriptor.resource(&d.name))
      .filter(|r| r.active && matches!(r.declared_type(), Ok(Some(t)) if t == resource_type))
      .map(|r| r.name.clone())
      .collect()
  }

  fn pod_template(
    &self,
    module: &Module,
    chain: &ParameterChain<'_>,
    labels: &Labels,
    config_map: &ConfigMap,
    restart_policy: &str,
    port: Option<u16>,
  ) -> Result<PodTemplateSpec, ContentError> {
    let Some(image) = chain.get_str(CONTAINER_IMAGE)? else {
      return Err(ContentError::MissingContainerImage {
        module: module.name.clone(),
      });
    };

    let mut metadata = ObjectMeta::new("", labels.clone());
    match config_map.compute_hash() {
      Ok(hash) => {
        metadata
          .annotations
          .insert(CONFIG_CHECKSUM_ANNOTATION.to_string(), hash.to_string());
      }
      Err(err) => warn!(module = %module.name, error = %err, "cannot compute config checksum"),
    }

    let container = Container {
      name: module.name.clone(),
      image: image.to_string(),
      ports: port
        .map(|p| ContainerPort {
          container_port: p,
          protocol: PROTOCOL_TCP.to_string(),
        })
        .into_iter()
        .collect(),
      termination_message_path: TERMINATION_MESSAGE_PATH.to_string(),
      termination_message_policy: TERMINATION_MESSAGE_POLICY.to_string(),
      image_pull_policy: IMAGE_PULL_POLICY.to_string(),
      env_from: vec![EnvFromSource {
        config_map_ref: LocalObjectReference {
          name: config_map.metadata.name.clone(),
        },
      }],
    };

    Ok(PodTemplateSpec {
      metadata,
      spec: PodSpec {
        containers: vec![container],
        restart_policy: restart_policy.to_string(),
        dns_policy: DNS_POLICY.to_string(),
        termination_grace_period_seconds: TERMINATION_GRACE_PERIOD_SECONDS,
        scheduler_name: SCHEDULER_NAME.to_string(),
        image_pull_secrets: self
          .required_of_type(module, RESOURCE_DOCKER_SECRET)
          .into_iter()
          .map(|name| LocalObjectReference { name })
          .collect(),
      },
    })
  }

  fn deployment(
    &self,
    module: &Module,
    chain: &ParameterChain<'_>,
    labels: &Labels,
    config_map: &ConfigMap,
    port: u16,
  ) -> Result<Deployment, ContentError> {
    let replicas = match chain.get_i64(INSTANCES)? {
      Some(n) => u32::try_from(n).map_err(|_| ContentError::invalid_type(&module.name, INSTANCES, "non-negative integer"))?,
      None => 1,
    };
    Ok(Deployment {
      api_version: API_APPS.to_string(),
      metadata: ObjectMeta::new(&module.name, labels.clone()),
      spec: DeploymentSpec {
        replicas,
        selector: LabelSelector {
          match_labels: app_selector(labels),
        },
        strategy: DeploymentStrategy {
          strategy_type: STRATEGY.to_string(),
          rolling_update: RollingUpdate {
            max_surge: MAX_SURGE,
            max_unavailable: MAX_UNAVAILABLE,
          },
        },
        revision_history_limit: REVISION_HISTORY_LIMIT,
        progress_deadline_seconds: PROGRESS_DEADLINE_SECONDS,
        template: self.pod_template(module, chain, labels, config_map, RESTART_ALWAYS, Some(port))?,
      },
    })
  }

  fn job(
    &self,
    module: &Module,
    chain: &ParameterChain<'_>,
    labels: &Labels,
    config_map: &ConfigMap,
  ) -> Result<Job, ContentError> {
    let backoff_limit = match chain.get_i64(RETRIES)? {
      Some(n) => u32::try_from(n).map_err(|_| ContentError::invalid_type(&module.name, RETRIES, "non-negative integer"))?,
      None => 0,
    };
    Ok(Job {
      api_version: API_BATCH.to_string(),
      metadata: ObjectMeta::new(&module.name, labels.clone()),
      spec: JobSpec {
        backoff_limit,
        template: self.pod_template(module, chain, labels, config_map, RESTART_NEVER, None)?,
      },
    })
  }

  /// One ingress rule per host of the module's explicit routes.
  fn ingress(&self, module: &Module, chain: &ParameterChain<'_>, labels: &Labels) -> Result<Option<Ingress>, ContentError> {
    let mut routes: Vec<String> = chain.get_str(ROUTE)?.map(str::to_string).into_iter().collect();
    for entry in chain.get_list(ROUTES)?.into_iter().flatten() {
      match entry {
        Value::String(s) => routes.push(s.clone()),
        Value::Object(map) => routes.extend(map.get(ROUTE).and_then(Value::as_str).map(str::to_string)),
        _ => return Err(ContentError::invalid_type(&module.name, ROUTES, "list of routes")),
      }
    }
    if routes.is_empty() {
      return Ok(None);
    }

    let hosts = dedup_stable(
      routes
        .iter()
        .map(|route| route_host(&substitute(route, self.placeholders)))
        .filter(|host| !host.is_empty()),
    );

    let rules = hosts
      .into_iter()
      .map(|host| IngressRule {
        host,
        http: HttpIngressRuleValue {
          paths: vec![HttpIngressPath {
            path: INGRESS_PATH.to_string(),
            path_type: INGRESS_PATH_TYPE.to_string(),
            backend: IngressBackend {
              service: IngressServiceBackend {
                name: module.name.clone(),
                port: ServiceBackendPort { number: SERVICE_PORT },
              },
            },
          }],
        },
      })
      .collect();

    Ok(Some(Ingress {
      api_version: API_NETWORKING.to_string(),
      metadata: ObjectMeta::new(&module.name, labels.clone()),
      spec: IngressSpec { rules },
    }))
  }
}

fn app_selector(labels: &Labels) -> Labels {
  labels
    .iter()
    .filter(|(k, _)| k.as_str() == LABEL_APP)
    .map(|(k, v)| (k.clone(), v.clone()))
    .collect()
}

fn container_port(chain: &ParameterChain<'_>) -> Result<u16, ContentError> {
  match chain.get_i64(PORT)? {
    None => Ok(DEFAULT_CONTAINER_PORT),
    Some(port) => u16::try_from(port)
      .ok()
      .filter(|p| *p > 0)
      .ok_or_else(|| ContentError::invalid_type(chain.owner(), PORT, "port number")),
  }
}

fn service(module: &Module, labels: &Labels, port: u16) -> Service {
  Service {
    api_version: API_V1.to_string(),
    metadata: ObjectMeta::new(&module.name, labels.clone()),
    spec: ServiceNetworkSpec {
      service_type: SERVICE_TYPE.to_string(),
      selector: app_selector(labels),
      ports: vec![ServicePort {
        port: SERVICE_PORT,
        target_port: port,
        protocol: PROTOCOL_TCP.to_string(),
      }],
    },
  }
}

/// The host part of a route: no scheme, port or path.
fn route_host(route: &str) -> String {
  let authority = uri::without_scheme(route).split('/').next().unwrap_or_default();
  authority.split(':').next().unwrap_or_default().to_string()
}

fn required_str<'c>(resource: &Resource, chain: &ParameterChain<'c>, kind: &str, key: &str) -> Result<&'c str, ContentError> {
  chain.get_str(key)?.ok_or_else(|| ContentError::MissingParameter {
    resource: resource.name.clone(),
    kind: kind.to_string(),
    parameter: key.to_string(),
  })
}

fn docker_secret(resource: &Resource, chain: &ParameterChain<'_>, labels: Labels) -> Result<Secret, ContentError> {
  let registry = required_str(resource, chain, RESOURCE_DOCKER_SECRET, REGISTRY)?;
  let username = required_str(resource, chain, RESOURCE_DOCKER_SECRET, USERNAME)?;
  let password = required_str(resource, chain, RESOURCE_DOCKER_SECRET, PASSWORD)?;

  let auth = STANDARD.encode(format!("{username}:{password}"));
  let mut auths = Map::new();
  auths.insert(
    registry.to_string(),
    json!({"username": username, "password": password, "auth": auth}),
  );
  let config = json!({ "auths": auths });
  Ok(Secret {
    api_version: API_V1.to_string(),
    metadata: ObjectMeta::new(&resource.name, labels),
    secret_type: SECRET_DOCKER_CONFIG.to_string(),
    data: [(DOCKER_CONFIG_KEY.to_string(), STANDARD.encode(config.to_string()))].into(),
  })
}

/// An opaque secret from the `data` parameter.
///
/// Strings are stored as-is, other values JSON-encoded, and all of them
/// base64-encoded.
fn opaque_secret(resource: &Resource, labels: Labels) -> Result<Secret, ContentError> {
  let empty = Map::new();
  let data = match resource.parameters.get(DATA) {
    None => &empty,
    Some(Value::Object(map)) => map,
    Some(other) => {
      return Err(ContentError::InvalidSecretData {
        resource: resource.name.clone(),
        actual: value_kind(other),
      });
    }
  };
  let encoded: BTreeMap<String, String> = data
    .iter()
    .map(|(key, value)| {
      let raw = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
      };
      (key.clone(), STANDARD.encode(raw))
    })
    .collect();
  Ok(Secret {
    api_version: API_V1.to_string(),
    metadata: ObjectMeta::new(&resource.name, labels),
    secret_type: SECRET_OPAQUE.to_string(),
    data: encoded,
  })
}

fn service_instance(
  resource: &Resource,
  chain: &ParameterChain<'_>,
  labels: Labels,
) -> Result<(ServiceInstance, ServiceBinding), ContentError> {
  let class = match chain.get_str(SERVICE_CLASS)? {
    Some(class) => class,
    None => required_str(resource, chain, RESOURCE_SERVICE_INSTANCE, SERVICE)?,
  };
  let plan = required_str(resource, chain, RESOURCE_SERVICE_INSTANCE, SERVICE_PLAN)?;
  let parameters: Parameters = match chain.get_map(SERVICE_CONFIG)? {
    Some(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
    None => Parameters::new(),
  };

  let instance = ServiceInstance {
    api_version: API_SERVICE_CATALOG.to_string(),
    metadata: ObjectMeta::new(&resource.name, labels.clone()),
    spec: ServiceInstanceSpec {
      cluster_service_class_external_name: class.to_string(),
      cluster_service_plan_external_name: plan.to_string(),
      parameters,
    },
  };
  let binding = ServiceBinding {
    api_version: API_SERVICE_CATALOG.to_string(),
    metadata: ObjectMeta::new(format!("{}{BINDING_SUFFIX}", resource.name), labels),
    spec: ServiceBindingSpec {
      instance_ref: LocalObjectReference {
        name: resource.name.clone(),
      },
      secret_name: resource.name.clone(),
    },
  };
  Ok((instance, binding))
}

/// Render manifests as one multi-document YAML stream.
pub fn to_yaml(manifests: &[Manifest]) -> Result<String, serde_yaml::Error> {
  let mut out = String::new();
  for manifest in manifests {
    out.push_str("---\n");
    out.push_str(&serde_yaml::to_string(manifest)?);
  }
  Ok(out)
}
