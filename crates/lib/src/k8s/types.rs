//! Typed Kubernetes manifests.
//!
//! Only the fields the synthesizer fills are modelled. Every manifest
//! serializes with its `kind` tag and `apiVersion`.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::descriptor::Parameters;
use crate::util::hash::Hashable;

pub type Labels = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum Manifest {
  ConfigMap(ConfigMap),
  Deployment(Deployment),
  Job(Job),
  Service(Service),
  Ingress(Ingress),
  Secret(Secret),
  ServiceInstance(ServiceInstance),
  ServiceBinding(ServiceBinding),
}

impl Manifest {
  pub fn kind(&self) -> &'static str {
    match self {
      Manifest::ConfigMap(_) => "ConfigMap",
      Manifest::Deployment(_) => "Deployment",
      Manifest::Job(_) => "Job",
      Manifest::Service(_) => "Service",
      Manifest::Ingress(_) => "Ingress",
      Manifest::Secret(_) => "Secret",
      Manifest::ServiceInstance(_) => "ServiceInstance",
      Manifest::ServiceBinding(_) => "ServiceBinding",
    }
  }

  pub fn metadata(&self) -> &ObjectMeta {
    match self {
      Manifest::ConfigMap(m) => &m.metadata,
      Manifest::Deployment(m) => &m.metadata,
      Manifest::Job(m) => &m.metadata,
      Manifest::Service(m) => &m.metadata,
      Manifest::Ingress(m) => &m.metadata,
      Manifest::Secret(m) => &m.metadata,
      Manifest::ServiceInstance(m) => &m.metadata,
      Manifest::ServiceBinding(m) => &m.metadata,
    }
  }

  pub fn name(&self) -> &str {
    &self.metadata().name
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ObjectMeta {
  #[serde(skip_serializing_if = "String::is_empty")]
  pub name: String,
  #[serde(skip_serializing_if = "Labels::is_empty")]
  pub labels: Labels,
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
  pub fn new(name: impl Into<String>, labels: Labels) -> Self {
    Self {
      name: name.into(),
      labels,
      annotations: BTreeMap::new(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalObjectReference {
  pub name: String,
}

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMap {
  pub api_version: String,
  pub metadata: ObjectMeta,
  pub data: BTreeMap<String, String>,
}

impl Hashable for ConfigMap {}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Secret {
  pub api_version: String,
  pub metadata: ObjectMeta,
  #[serde(rename = "type")]
  pub secret_type: String,
  /// Base64-encoded values.
  pub data: BTreeMap<String, String>,
}

// ============================================================================
// Workloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
  pub api_version: String,
  pub metadata: ObjectMeta,
  pub spec: DeploymentSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
  pub replicas: u32,
  pub selector: LabelSelector,
  pub strategy: DeploymentStrategy,
  pub revision_history_limit: u32,
  pub progress_deadline_seconds: u32,
  pub template: PodTemplateSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
  pub match_labels: Labels,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStrategy {
  #[serde(rename = "type")]
  pub strategy_type: String,
  pub rolling_update: RollingUpdate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollingUpdate {
  pub max_surge: u32,
  pub max_unavailable: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
  pub api_version: String,
  pub metadata: ObjectMeta,
  pub spec: JobSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSpec {
  pub backoff_limit: u32,
  pub template: PodTemplateSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodTemplateSpec {
  pub metadata: ObjectMeta,
  pub spec: PodSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
  pub containers: Vec<Container>,
  pub restart_policy: String,
  pub dns_policy: String,
  pub termination_grace_period_seconds: u64,
  pub scheduler_name: String,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub image_pull_secrets: Vec<LocalObjectReference>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
  pub name: String,
  pub image: String,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub ports: Vec<ContainerPort>,
  pub termination_message_path: String,
  pub termination_message_policy: String,
  pub image_pull_policy: String,
  pub env_from: Vec<EnvFromSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
  pub container_port: u16,
  pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvFromSource {
  pub config_map_ref: LocalObjectReference,
}

// ============================================================================
// Networking
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
  pub api_version: String,
  pub metadata: ObjectMeta,
  pub spec: ServiceNetworkSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceNetworkSpec {
  #[serde(rename = "type")]
  pub service_type: String,
  pub selector: Labels,
  pub ports: Vec<ServicePort>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePort {
  pub port: u16,
  pub target_port: u16,
  pub protocol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ingress {
  pub api_version: String,
  pub metadata: ObjectMeta,
  pub spec: IngressSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressSpec {
  pub rules: Vec<IngressRule>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressRule {
  pub host: String,
  pub http: HttpIngressRuleValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpIngressRuleValue {
  pub paths: Vec<HttpIngressPath>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpIngressPath {
  pub path: String,
  pub path_type: String,
  pub backend: IngressBackend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressBackend {
  pub service: IngressServiceBackend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressServiceBackend {
  pub name: String,
  pub port: ServiceBackendPort,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBackendPort {
  pub number: u16,
}

// ============================================================================
// Service catalog
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInstance {
  pub api_version: String,
  pub metadata: ObjectMeta,
  pub spec: ServiceInstanceSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInstanceSpec {
  pub cluster_service_class_external_name: String,
  pub cluster_service_plan_external_name: String,
  #[serde(skip_serializing_if = "Parameters::is_empty")]
  pub parameters: Parameters,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBinding {
  pub api_version: String,
  pub metadata: ObjectMeta,
  pub spec: ServiceBindingSpec,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceBindingSpec {
  pub instance_ref: LocalObjectReference,
  pub secret_name: String,
}
