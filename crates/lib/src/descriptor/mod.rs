//! Deployment descriptor model and loading.
//!
//! Descriptors are normally produced by an archive parser. For tooling and
//! tests they can also be read directly from YAML.

mod types;

pub use types::*;

use std::fs;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::consts::TYPE;
use crate::error::ContentError;

/// Errors that can occur while loading a descriptor.
#[derive(Debug, Error)]
pub enum DescriptorError {
  #[error("failed to read descriptor {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse descriptor: {0}")]
  Parse(#[from] serde_yaml::Error),

  #[error("duplicate {kind} name \"{name}\" in descriptor")]
  DuplicateName { kind: &'static str, name: String },
}

impl DeploymentDescriptor {
  /// Parse a descriptor from YAML text.
  pub fn from_yaml_str(input: &str) -> Result<Self, DescriptorError> {
    let descriptor: DeploymentDescriptor = serde_yaml::from_str(input)?;
    descriptor.check_unique_names()?;
    Ok(descriptor)
  }

  /// Read and parse a descriptor file.
  pub fn from_path(path: &Path) -> Result<Self, DescriptorError> {
    debug!(path = %path.display(), "loading deployment descriptor");
    let content = fs::read_to_string(path).map_err(|source| DescriptorError::Read {
      path: path.display().to_string(),
      source,
    })?;
    Self::from_yaml_str(&content)
  }

  fn check_unique_names(&self) -> Result<(), DescriptorError> {
    let mut seen = std::collections::HashSet::new();
    for module in &self.modules {
      if !seen.insert(module.name.as_str()) {
        return Err(DescriptorError::DuplicateName {
          kind: "module",
          name: module.name.clone(),
        });
      }
    }
    let mut seen = std::collections::HashSet::new();
    for resource in &self.resources {
      if !seen.insert(resource.name.as_str()) {
        return Err(DescriptorError::DuplicateName {
          kind: "resource",
          name: resource.name.clone(),
        });
      }
    }
    Ok(())
  }

  pub fn module(&self, name: &str) -> Option<&Module> {
    self.modules.iter().find(|m| m.name == name)
  }

  pub fn resource(&self, name: &str) -> Option<&Resource> {
    self.resources.iter().find(|r| r.name == name)
  }

  /// Find the provided dependency with the given name on any module.
  pub fn provided_dependency(&self, name: &str) -> Option<(&Module, &ProvidedDependency)> {
    self
      .modules
      .iter()
      .find_map(|m| m.provides.iter().find(|p| p.name == name).map(|p| (m, p)))
  }
}

impl Resource {
  /// The declared type of the resource.
  ///
  /// A `type` parameter overrides the `type` attribute.
  pub fn declared_type(&self) -> Result<Option<&str>, ContentError> {
    match self.parameters.get(TYPE) {
      Some(Value::String(s)) => Ok(Some(s.as_str())),
      Some(_) => Err(ContentError::invalid_type(&self.name, TYPE, "string")),
      None => Ok(self.resource_type.as_deref()),
    }
  }

  /// The service kind of the resource, or `None` for resources that do not
  /// describe a service (configuration resources, cluster secrets, ...).
  pub fn service_kind(&self) -> Result<Option<ResourceKind>, ContentError> {
    Ok(self.declared_type()?.and_then(|t| t.parse().ok()))
  }

  pub fn is_service(&self) -> bool {
    matches!(self.service_kind(), Ok(Some(_)))
  }
}
