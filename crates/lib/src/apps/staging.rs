//! Staging parameters: buildpacks, health checks, lifecycle and docker.

use serde_json::Value;

use crate::consts::*;
use crate::error::ContentError;
use crate::params::ParameterChain;

use super::{DockerInfo, LifecycleType, Staging};

const HTTP_HEALTH_CHECK: &str = "http";
const DEFAULT_HTTP_ENDPOINT: &str = "/";

pub fn parse_staging(chain: &ParameterChain<'_>) -> Result<Staging, ContentError> {
  let buildpacks = if chain.contains(BUILDPACKS) {
    chain.get_string_list(BUILDPACKS)?
  } else {
    chain.get_string_list(BUILDPACK)?
  };
  let health_check_type = chain.get_str(HEALTH_CHECK_TYPE)?.map(str::to_string);
  let health_check_http_endpoint = match chain.get_str(HEALTH_CHECK_HTTP_ENDPOINT)? {
    Some(endpoint) => Some(endpoint.to_string()),
    None if health_check_type.as_deref() == Some(HTTP_HEALTH_CHECK) => Some(DEFAULT_HTTP_ENDPOINT.to_string()),
    None => None,
  };
  let docker = parse_docker(chain)?;
  let lifecycle = parse_lifecycle(chain)?;
  validate_lifecycle(chain.owner(), lifecycle, &buildpacks, docker.as_ref())?;

  Ok(Staging {
    command: chain.get_str(COMMAND)?.map(str::to_string),
    buildpacks,
    stack: chain.get_str(STACK)?.map(str::to_string),
    health_check_type,
    health_check_timeout: chain.get_i64(HEALTH_CHECK_TIMEOUT)?,
    health_check_invocation_timeout: chain.get_i64(HEALTH_CHECK_INVOCATION_TIMEOUT)?,
    health_check_http_endpoint,
    ssh_enabled: chain.get_bool(ENABLE_SSH)?,
    lifecycle,
    docker,
  })
}

/// The `docker` parameter: `{image, username, password}`.
pub fn parse_docker(chain: &ParameterChain<'_>) -> Result<Option<DockerInfo>, ContentError> {
  let Some(map) = chain.get_map(DOCKER)? else {
    return Ok(None);
  };
  let field = |key: &str| -> Result<Option<String>, ContentError> {
    match map.get(key) {
      None | Some(Value::Null) => Ok(None),
      Some(Value::String(s)) => Ok(Some(s.clone())),
      Some(_) => Err(ContentError::invalid_type(chain.owner(), &format!("{DOCKER}#{key}"), "string")),
    }
  };
  let Some(image) = field("image")? else {
    return Err(ContentError::invalid_type(chain.owner(), DOCKER, "map with an image"));
  };
  Ok(Some(DockerInfo {
    image,
    username: field(USERNAME)?,
    password: field(PASSWORD)?,
  }))
}

fn parse_lifecycle(chain: &ParameterChain<'_>) -> Result<Option<LifecycleType>, ContentError> {
  let Some(value) = chain.get_str(LIFECYCLE)? else {
    return Ok(None);
  };
  match value.to_ascii_lowercase().as_str() {
    "buildpack" => Ok(Some(LifecycleType::Buildpack)),
    "docker" => Ok(Some(LifecycleType::Docker)),
    "cnb" => Ok(Some(LifecycleType::Cnb)),
    _ => Err(ContentError::UnsupportedLifecycle {
      module: chain.owner().to_string(),
      value: value.to_string(),
    }),
  }
}

fn validate_lifecycle(
  module: &str,
  lifecycle: Option<LifecycleType>,
  buildpacks: &[String],
  docker: Option<&DockerInfo>,
) -> Result<(), ContentError> {
  let module = module.to_string();
  match lifecycle {
    Some(LifecycleType::Cnb) if buildpacks.is_empty() => Err(ContentError::BuildpacksRequiredForCnb { module }),
    Some(LifecycleType::Docker) if docker.is_none() => Err(ContentError::DockerInfoRequired { module }),
    Some(LifecycleType::Docker) if !buildpacks.is_empty() => Err(ContentError::BuildpacksNotAllowedWithDocker { module }),
    Some(other) if other != LifecycleType::Docker && docker.is_some() => Err(ContentError::DockerInfoNotAllowed {
      module,
      lifecycle: format!("{other:?}").to_lowercase(),
    }),
    _ => Ok(()),
  }
}
