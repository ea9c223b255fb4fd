//! Configuration entries from public provided dependencies.
//!
//! Each public provided dependency with properties is published as one entry
//! so that other packages deployed to a visible org and space can consume it.

mod types;

pub use types::*;

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::config::SystemParameters;
use crate::consts::*;
use crate::descriptor::{DeploymentDescriptor, Module, ProvidedDependency};
use crate::error::{ContentError, value_kind};
use crate::util::dedup_stable;

/// Builds configuration entries for the modules of one descriptor.
#[derive(Debug, Clone, Copy)]
pub struct ConfigurationEntryModelBuilder<'a> {
  descriptor: &'a DeploymentDescriptor,
  system: &'a SystemParameters,
}

impl<'a> ConfigurationEntryModelBuilder<'a> {
  pub fn new(descriptor: &'a DeploymentDescriptor, system: &'a SystemParameters) -> Self {
    Self { descriptor, system }
  }

  /// Entries keyed by module name. Modules without public dependencies map
  /// to an empty list.
  ///
  /// The package version is only parsed once an entry needs it.
  pub fn build(&self) -> Result<BTreeMap<String, Vec<ConfigurationEntry>>, ContentError> {
    let mut version = None;
    let mut entries = BTreeMap::new();
    for module in &self.descriptor.modules {
      entries.insert(module.name.clone(), self.module_entries(module, &mut version)?);
    }
    Ok(entries)
  }

  fn module_entries(
    &self,
    module: &Module,
    version: &mut Option<Version>,
  ) -> Result<Vec<ConfigurationEntry>, ContentError> {
    let mut entries = Vec::new();
    for dependency in module.provides.iter().filter(|d| d.public && !d.properties.is_empty()) {
      let version = match version.as_ref() {
        Some(parsed) => parsed.clone(),
        None => version
          .insert(Version::parse(&self.descriptor.id, &self.descriptor.version)?)
          .clone(),
      };
      let entry = self.entry(dependency, &version)?;
      debug!(module = %module.name, provider_id = %entry.provider_id, "built configuration entry");
      entries.push(entry);
    }
    Ok(entries)
  }

  fn entry(&self, dependency: &ProvidedDependency, version: &Version) -> Result<ConfigurationEntry, ContentError> {
    let provider_namespace = match dependency.parameters.get(PROVIDER_NAMESPACE) {
      Some(Value::String(ns)) if !ns.is_empty() => ns.clone(),
      Some(Value::String(_)) | None => PROVIDER_NAMESPACE_DEFAULT.to_string(),
      Some(_) => return Err(ContentError::invalid_type(&dependency.name, PROVIDER_NAMESPACE, "string")),
    };
    let content = serde_json::to_string(&dependency.properties)
      .map_err(|_| ContentError::invalid_type(&dependency.name, "properties", "serializable map"))?;

    Ok(ConfigurationEntry {
      provider_nid: PROVIDER_NID.to_string(),
      provider_id: provider_id(&self.descriptor.id, &dependency.name),
      provider_namespace,
      version: version.clone(),
      target: CloudTarget::new(&self.system.org, &self.system.space),
      content,
      visibility: self.visibility(dependency)?,
      space_guid: self.system.space_guid.clone(),
    })
  }

  /// Who may consume the entry.
  ///
  /// Declared targets are always accompanied by the producing org and space.
  /// Without declared targets any space of the producing org may consume it.
  pub fn visibility(&self, dependency: &ProvidedDependency) -> Result<Vec<CloudTarget>, ContentError> {
    let Some(value) = dependency.parameters.get(VISIBILITY) else {
      return Ok(vec![CloudTarget::any_space(&self.system.org)]);
    };
    let invalid = |reason: String| ContentError::InvalidVisibility {
      dependency: dependency.name.clone(),
      reason,
    };
    let Value::Array(items) = value else {
      return Err(invalid(format!("expected a list, got {}", value_kind(value))));
    };

    let mut targets = vec![CloudTarget::new(&self.system.org, &self.system.space)];
    for item in items {
      let Value::Object(map) = item else {
        return Err(invalid(format!("expected a map target, got {}", value_kind(item))));
      };
      let field = |key: &str| match map.get(key) {
        None | Some(Value::Null) => Ok(ANY_TARGET.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(invalid(format!("\"{key}\" must be a string, got {}", value_kind(other)))),
      };
      targets.push(CloudTarget::new(field(VISIBILITY_ORG)?, field(VISIBILITY_SPACE)?));
    }
    Ok(dedup_stable(targets))
  }
}

/// `<mta-id>:<dependency>`
pub fn provider_id(mta_id: &str, dependency: &str) -> String {
  format!("{mta_id}{PROVIDER_ID_DELIMITER}{dependency}")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{SHOP, descriptor, system_parameters};
  use serde_json::json;

  fn build(yaml: &str) -> Result<BTreeMap<String, Vec<ConfigurationEntry>>, ContentError> {
    let d = descriptor(yaml);
    let system = system_parameters();
    ConfigurationEntryModelBuilder::new(&d, &system).build()
  }

  // ==========================================================================
  // Entries
  // ==========================================================================

  mod entries {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn public_dependencies_with_properties() {
      let entries = build(SHOP).unwrap();

      assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["backend", "web"]);
      let web = &entries["web"];
      assert_eq!(web.len(), 1);

      let entry = &web[0];
      assert_eq!(entry.provider_nid, "mta");
      assert_eq!(entry.provider_id, "com.example.shop:web-ui");
      assert_eq!(entry.provider_namespace, "default");
      assert_eq!(entry.version.to_string(), "1.2.0");
      assert_eq!(entry.target.to_string(), "acme dev");
      assert_eq!(entry.content, r#"{"url":"https://web.example.com"}"#);
      assert_eq!(entry.visibility, vec![CloudTarget::any_space("acme")]);
      assert_eq!(entry.space_guid.as_deref(), Some("space-guid"));
    }

    #[test]
    fn provider_namespace_parameter() {
      let entries = build(
        r#"
ID: ns
version: "2"
modules:
  - name: api
    provides:
      - name: api-url
        public: true
        parameters:
          namespace: team-a
        properties:
          url: https://api
"#,
      )
      .unwrap();
      let entry = &entries["api"][0];
      assert_eq!(entry.provider_namespace, "team-a");
      assert_eq!(entry.version.to_string(), "2.0.0");
    }

    #[test]
    fn invalid_version_fails() {
      let err = build(
        r#"
ID: bad
version: one.two
modules:
  - name: api
    provides:
      - name: api-url
        public: true
        properties:
          url: https://api
"#,
      )
      .unwrap_err();
      assert_eq!(
        err,
        ContentError::InvalidVersion {
          mta: "bad".to_string(),
          version: "one.two".to_string(),
        }
      );
    }
    #[test]
    fn version_is_not_needed_without_public_dependencies() {
      let entries = build(
        r#"
ID: private
version: 1.0.0.1
modules:
  - name: worker
    provides:
      - name: internal
        properties:
          url: https://worker
"#,
      )
      .unwrap();
      assert!(entries["worker"].is_empty());
    }
  }

  // ==========================================================================
  // Visibility
  // ==========================================================================

  mod visibility {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dependency(visibility: Value) -> ProvidedDependency {
      ProvidedDependency {
        name: "api".to_string(),
        public: true,
        parameters: [(VISIBILITY.to_string(), visibility)].into_iter().collect(),
        properties: Default::default(),
      }
    }

    fn visibility(value: Value) -> Result<Vec<CloudTarget>, ContentError> {
      let d = descriptor("ID: v\nversion: 1.0.0\n");
      let system = system_parameters();
      ConfigurationEntryModelBuilder::new(&d, &system).visibility(&dependency(value))
    }

    #[test]
    fn declared_targets_include_producer() {
      let targets = visibility(json!([
        {"org": "partner", "space": "prod"},
        {"org": "partner"},
        {"space": "dev"},
        {"org": "acme", "space": "dev"}
      ]))
      .unwrap();
      assert_eq!(
        targets,
        vec![
          CloudTarget::new("acme", "dev"),
          CloudTarget::new("partner", "prod"),
          CloudTarget::new("partner", "*"),
          CloudTarget::new("*", "dev"),
        ]
      );
    }

    #[test]
    fn malformed_targets_fail() {
      assert!(matches!(
        visibility(json!("everyone")),
        Err(ContentError::InvalidVisibility { .. })
      ));
      assert!(matches!(
        visibility(json!(["acme"])),
        Err(ContentError::InvalidVisibility { .. })
      ));
      assert!(matches!(
        visibility(json!([{"org": 1}])),
        Err(ContentError::InvalidVisibility { .. })
      ));
    }
  }

  #[test]
  fn version_parsing() {
    let v = Version::parse("m", "1.2.3-SNAPSHOT").unwrap();
    assert_eq!((v.major, v.minor, v.patch), (1, 2, 3));
    assert_eq!(v.qualifier.as_deref(), Some("SNAPSHOT"));
    assert_eq!(v.to_string(), "1.2.3-SNAPSHOT");
    assert!(Version::parse("m", "1.2.3.4").is_err());
    assert!(Version::parse("m", "1.2-").is_err());
    assert!(Version::parse("m", "").is_err());
  }
}
