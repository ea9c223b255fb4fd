//! Content errors raised while compiling a descriptor into a cloud model.
//!
//! A content error always points at something the descriptor author can fix:
//! every variant names the module or resource and the parameter involved.

use thiserror::Error;

/// Errors caused by the content of a deployment descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
  #[error("invalid type for parameter \"{parameter}\" of \"{owner}\": expected {expected}")]
  InvalidType {
    owner: String,
    parameter: String,
    expected: &'static str,
  },

  #[error("missing required parameter \"{parameter}\" for {kind} \"{resource}\"")]
  MissingParameter {
    resource: String,
    kind: String,
    parameter: String,
  },

  #[error("invalid service config for service \"{service}\": expected a map, got {actual}")]
  InvalidServiceConfig { service: String, actual: String },

  #[error("invalid binding parameters for \"{module}#{dependency}#config\": expected a map, got {actual}")]
  InvalidBindingParameters {
    module: String,
    dependency: String,
    actual: String,
  },

  #[error("invalid tcp route for module \"{module}\": \"tcp\" and \"tcps\" cannot both be set")]
  InvalidTcpRoute { module: String },

  #[error(
    "container image for module \"{module}\" is not specified, use the \"container-image\" parameter to do so"
  )]
  MissingContainerImage { module: String },

  #[error("invalid secret data for resource \"{resource}\": expected a map, got {actual}")]
  InvalidSecretData { resource: String, actual: String },

  #[error("unknown resource type \"{value}\" for resource \"{resource}\"")]
  UnknownResourceType { resource: String, value: String },

  #[error("unknown module type \"{value}\" for module \"{module}\"")]
  UnknownModuleType { module: String, value: String },

  #[error("invalid memory value \"{value}\" for \"{owner}\"")]
  InvalidMemory { owner: String, value: String },

  #[error("unsupported lifecycle value \"{value}\" for module \"{module}\"")]
  UnsupportedLifecycle { module: String, value: String },

  #[error("buildpacks must be specified for module \"{module}\" when lifecycle is \"cnb\"")]
  BuildpacksRequiredForCnb { module: String },

  #[error("docker info is required for module \"{module}\" when lifecycle is \"docker\"")]
  DockerInfoRequired { module: String },

  #[error("buildpacks are not allowed for module \"{module}\" when lifecycle is \"docker\"")]
  BuildpacksNotAllowedWithDocker { module: String },

  #[error("docker info is not allowed for module \"{module}\" with lifecycle \"{lifecycle}\"")]
  DockerInfoNotAllowed { module: String, lifecycle: String },

  #[error("cannot shorten name \"{name}\" to {max_length} characters")]
  CannotShortenName { name: String, max_length: usize },

  #[error("module \"{module}\" requires unknown module \"{dependency}\" through \"deployed-after\"")]
  UnknownDeployedAfter { module: String, dependency: String },

  #[error("circular \"deployed-after\" dependencies between modules: {modules:?}")]
  DeploymentOrderCycle { modules: Vec<String> },

  #[error("invalid version \"{version}\" of multi-target application \"{mta}\"")]
  InvalidVersion { mta: String, version: String },

  #[error("invalid visibility target for provided dependency \"{dependency}\": {reason}")]
  InvalidVisibility { dependency: String, reason: String },

  #[error(
    "cannot create service \"{service}\": no offerings among {candidates:?} provide plan \"{plan}\""
  )]
  NoOfferingsMatchPlan {
    service: String,
    candidates: Vec<String>,
    plan: String,
  },

  #[error("cannot create service \"{service}\" from offerings {offerings:?}")]
  CannotCreateService { service: String, offerings: Vec<String> },
}

impl ContentError {
  pub(crate) fn invalid_type(owner: &str, parameter: &str, expected: &'static str) -> Self {
    ContentError::InvalidType {
      owner: owner.to_string(),
      parameter: parameter.to_string(),
      expected,
    }
  }
}

/// Short, human readable name of a JSON value's type for error messages.
pub(crate) fn value_kind(value: &serde_json::Value) -> String {
  match value {
    serde_json::Value::Null => "null",
    serde_json::Value::Bool(_) => "boolean",
    serde_json::Value::Number(_) => "number",
    serde_json::Value::String(_) => "string",
    serde_json::Value::Array(_) => "list",
    serde_json::Value::Object(_) => "map",
  }
  .to_string()
}
