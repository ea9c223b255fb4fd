//! Per-application environment computation.
//!
//! The environment of a module is assembled in a fixed order, later steps
//! overriding earlier ones on key collisions:
//!
//! 1. `MTA_METADATA`, `MTA_MODULE_METADATA` and the module's public provided
//!    dependency names
//! 2. `MTA_SERVICES`, the services the application is bound to
//! 3. `DEPLOY_ATTRIBUTES` (allow-listed module parameters) and `DEPLOY_ID`
//! 4. module properties
//! 5. properties of required dependencies, either flattened or collected
//!    into named groups of `{name, ...properties}` records
//!
//! Groups are written last. Among sibling dependencies the first one to
//! declare a flattened key keeps it.

mod types;

pub use types::*;

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value, json};
use tracing::debug;

use crate::consts::*;
use crate::descriptor::{DeploymentDescriptor, Module};
use crate::error::ContentError;
use crate::params::ParameterChain;
use crate::placeholder::{PlaceholderContext, substitute};

/// Builds application environments for the modules of one descriptor.
#[derive(Debug, Clone, Copy)]
pub struct EnvironmentModelBuilder<'a> {
  descriptor: &'a DeploymentDescriptor,
  placeholders: &'a PlaceholderContext,
  deploy_id: Option<&'a str>,
}

impl<'a> EnvironmentModelBuilder<'a> {
  pub fn new(
    descriptor: &'a DeploymentDescriptor,
    placeholders: &'a PlaceholderContext,
    deploy_id: Option<&'a str>,
  ) -> Self {
    Self {
      descriptor,
      placeholders,
      deploy_id,
    }
  }

  /// The environment of `module`, bound to `services`.
  pub fn build(&self, module: &Module, services: &[String]) -> Result<Environment, ContentError> {
    let mut env = BTreeMap::new();
    self.add_metadata(&mut env, module);
    env.insert(ENV_MTA_SERVICES.to_string(), json!(services));
    self.add_attributes(&mut env, module)?;
    add_properties(&mut env, module);
    add_dependencies(&mut env, module);
    Ok(Environment(env))
  }

  fn add_metadata(&self, env: &mut BTreeMap<String, Value>, module: &Module) {
    let d = self.descriptor;
    let mut mta = Map::new();
    mta.insert(ATTR_ID.to_string(), json!(d.id));
    mta.insert(ATTR_VERSION.to_string(), json!(d.version));
    insert_some(&mut mta, ATTR_DESCRIPTION, d.description.as_deref());
    insert_some(&mut mta, ATTR_PROVIDER, d.provider.as_deref());
    insert_some(&mut mta, ATTR_COPYRIGHT, d.copyright.as_deref());
    env.insert(ENV_MTA_METADATA.to_string(), Value::Object(mta));

    let mut module_metadata = Map::new();
    module_metadata.insert(ATTR_NAME.to_string(), json!(module.name));
    insert_some(&mut module_metadata, ATTR_DESCRIPTION, module.description.as_deref());
    env.insert(ENV_MTA_MODULE_METADATA.to_string(), Value::Object(module_metadata));

    let public: Vec<&str> = module
      .provides
      .iter()
      .filter(|p| p.public)
      .map(|p| p.name.as_str())
      .collect();
    env.insert(ENV_MTA_MODULE_PUBLIC_PROVIDED_DEPENDENCIES.to_string(), json!(public));
  }

  fn add_attributes(&self, env: &mut BTreeMap<String, Value>, module: &Module) -> Result<(), ContentError> {
    let mut attributes: Map<String, Value> = module
      .parameters
      .iter()
      .filter(|(key, _)| APP_ATTRIBUTES.contains(&key.as_str()))
      .map(|(key, value)| (key.clone(), value.clone()))
      .collect();

    for key in [REGISTER_SERVICE_URL_SERVICE_URL, SERVICE_BROKER_URL] {
      if let Some(Value::String(url)) = attributes.get(key) {
        let resolved = substitute(url, self.placeholders);
        attributes.insert(key.to_string(), Value::String(resolved));
      }
    }

    let check_deploy_id = {
      let scope = &module.parameters;
      ParameterChain::new(&module.name, vec![scope]).bool_or(CHECK_DEPLOY_ID, false)?
    };

    if !attributes.is_empty() {
      env.insert(ENV_DEPLOY_ATTRIBUTES.to_string(), Value::Object(attributes));
    }
    if check_deploy_id {
      match self.deploy_id {
        Some(id) => {
          env.insert(ENV_DEPLOY_ID.to_string(), json!(id));
        }
        None => debug!(module = %module.name, "deploy id check requested without a deploy id"),
      }
    }
    Ok(())
  }

  /// Restart triggers of a module from `restart-on-env-change`.
  ///
  /// Every trigger defaults to restarting.
  pub fn restart_parameters(&self, chain: &ParameterChain<'_>) -> Result<RestartParameters, ContentError> {
    let Some(map) = chain.get_map(RESTART_ON_ENV_CHANGE)? else {
      return Ok(RestartParameters::default());
    };
    let flag = |key: &str| -> Result<bool, ContentError> {
      match map.get(key) {
        None | Some(Value::Null) => Ok(true),
        Some(Value::Bool(b)) => Ok(*b),
        Some(_) => Err(ContentError::invalid_type(
          chain.owner(),
          &format!("{RESTART_ON_ENV_CHANGE}#{key}"),
          "boolean",
        )),
      }
    };
    Ok(RestartParameters {
      on_vcap_application_change: flag(VCAP_APPLICATION_ENV)?,
      on_vcap_services_change: flag(VCAP_SERVICES_ENV)?,
      on_user_provided_change: flag(USER_PROVIDED_ENV)?,
    })
  }
}

fn insert_some(map: &mut Map<String, Value>, key: &str, value: Option<&str>) {
  if let Some(value) = value {
    map.insert(key.to_string(), json!(value));
  }
}

fn add_properties(env: &mut BTreeMap<String, Value>, module: &Module) {
  for (key, value) in &module.properties {
    if !APP_ATTRIBUTES.contains(&key.as_str()) {
      env.insert(key.clone(), value.clone());
    }
  }
}

fn add_dependencies(env: &mut BTreeMap<String, Value>, module: &Module) {
  let mut groups: BTreeMap<String, Vec<Value>> = BTreeMap::new();
  let mut flattened = BTreeSet::new();

  for dependency in &module.requires {
    let destinations = dependency.destination_groups();
    if destinations.is_empty() {
      for (key, value) in &dependency.properties {
        if flattened.insert(key.clone()) {
          env.insert(key.clone(), value.clone());
        } else {
          debug!(module = %module.name, dependency = %dependency.name, key = %key, "key already set by an earlier dependency");
        }
      }
      continue;
    }

    let mut record = Map::new();
    record.insert(ATTR_NAME.to_string(), json!(dependency.name));
    for (key, value) in &dependency.properties {
      record.insert(key.clone(), value.clone());
    }
    for group in destinations {
      groups.entry(group).or_default().push(Value::Object(record.clone()));
    }
  }

  for (group, records) in groups {
    env.insert(group, Value::Array(records));
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::{SHOP, descriptor, system_parameters};

  fn build(d: &DeploymentDescriptor, module: &str, deploy_id: Option<&str>) -> Environment {
    let ctx = system_parameters().placeholder_context();
    let builder = EnvironmentModelBuilder::new(d, &ctx, deploy_id);
    builder
      .build(d.module(module).unwrap(), &["shop-db".to_string()])
      .unwrap()
  }

  // ==========================================================================
  // Metadata, services and attributes
  // ==========================================================================

  mod content {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn metadata_and_services() {
      let d = descriptor(SHOP);
      let env = build(&d, "web", None);

      assert_eq!(
        env.get(ENV_MTA_METADATA).unwrap(),
        &json!({"id": "com.example.shop", "version": "1.2.0", "description": "Example shop", "provider": "Example Inc."})
      );
      assert_eq!(
        env.get(ENV_MTA_MODULE_METADATA).unwrap(),
        &json!({"name": "web", "description": "Storefront"})
      );
      assert_eq!(
        env.get(ENV_MTA_MODULE_PUBLIC_PROVIDED_DEPENDENCIES).unwrap(),
        &json!(["web-ui"])
      );
      assert_eq!(env.get(ENV_MTA_SERVICES).unwrap(), &json!(["shop-db"]));
    }

    #[test]
    fn deploy_id_is_injected_when_checked() {
      let d = descriptor(SHOP);
      let env = build(&d, "web", Some("deploy-42"));
      assert_eq!(env.get(ENV_DEPLOY_ID).unwrap(), &json!("deploy-42"));
      assert_eq!(
        env.get(ENV_DEPLOY_ATTRIBUTES).unwrap(),
        &json!({"check-deploy-id": true})
      );

      let env = build(&d, "backend", Some("deploy-42"));
      assert!(!env.contains_key(ENV_DEPLOY_ID));
      assert!(!env.contains_key(ENV_DEPLOY_ATTRIBUTES));
    }

    #[test]
    fn attribute_urls_are_resolved() {
      let d = descriptor(
        r#"
ID: broker
version: 1.0.0
modules:
  - name: broker
    parameters:
      create-service-broker: true
      service-broker-url: "{xsa-placeholder-protocol}://broker.{xsa-placeholder-domain-default}"
      memory: 1G
"#,
      );
      let env = build(&d, "broker", None);
      assert_eq!(
        env.get(ENV_DEPLOY_ATTRIBUTES).unwrap(),
        &json!({
          "create-service-broker": true,
          "service-broker-url": "https://broker.cfapps.example.com",
        })
      );
    }

    #[test]
    fn properties_are_copied_through() {
      let d = descriptor(SHOP);
      let env = build(&d, "web", None);
      assert_eq!(env.get("GREETING").unwrap(), &json!("hello"));
    }
  }

  // ==========================================================================
  // Dependencies and groups
  // ==========================================================================

  mod dependencies {
    use super::*;
    use pretty_assertions::assert_eq;

    const GROUPS: &str = r#"
ID: groups
version: 1.0.0
modules:
  - name: app
    properties:
      url: from-module
    requires:
      - name: first
        properties:
          url: from-first
          token: abc
      - name: second
        properties:
          url: from-second
      - name: api-a
        group: [destinations, apis]
        properties:
          url: https://a
      - name: api-b
        group: destinations
        list: backends
        properties:
          url: https://b
      - name: api-c
        group: destinations
        properties:
          url: https://c
"#;

    #[test]
    fn flattened_dependencies_first_declaration_wins() {
      let d = descriptor(GROUPS);
      let env = build(&d, "app", None);
      assert_eq!(env.get("url").unwrap(), &json!("from-first"));
      assert_eq!(env.get("token").unwrap(), &json!("abc"));
    }

    #[test]
    fn groups_keep_declaration_order() {
      let d = descriptor(GROUPS);
      let env = build(&d, "app", None);
      assert_eq!(
        env.get("destinations").unwrap(),
        &json!([
          {"name": "api-a", "url": "https://a"},
          {"name": "api-c", "url": "https://c"},
        ])
      );
      assert_eq!(env.get("apis").unwrap(), &json!([{"name": "api-a", "url": "https://a"}]));
      assert_eq!(env.get("backends").unwrap(), &json!([{"name": "api-b", "url": "https://b"}]));
    }

    #[test]
    fn building_twice_is_byte_identical() {
      let d = descriptor(GROUPS);
      let first = serde_json::to_string(&build(&d, "app", None)).unwrap();
      let second = serde_json::to_string(&build(&d, "app", None)).unwrap();
      assert_eq!(first, second);
    }
  }

  // ==========================================================================
  // Rendering and restart triggers
  // ==========================================================================

  mod rendering {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strings_stay_raw_and_structures_become_json() {
      let d = descriptor(SHOP);
      let env = build(&d, "web", None).to_env_strings(false);
      assert_eq!(env["GREETING"], "hello");
      assert_eq!(env[ENV_MTA_SERVICES], r#"["shop-db"]"#);

      let pretty = build(&d, "web", None).to_env_strings(true);
      assert!(pretty[ENV_MTA_MODULE_METADATA].contains('\n'));
    }

    #[test]
    fn restart_triggers_default_to_true() {
      let d = descriptor(
        r#"
ID: r
version: 1.0.0
modules:
  - name: a
  - name: b
    parameters:
      restart-on-env-change:
        vcap-services: false
  - name: c
    parameters:
      restart-on-env-change:
        user-provided: "no"
"#,
      );
      let ctx = system_parameters().placeholder_context();
      let builder = EnvironmentModelBuilder::new(&d, &ctx, None);
      let resolver = crate::params::ParameterChainResolver::new(&d);

      let a = builder.restart_parameters(&resolver.module_chain("a").unwrap()).unwrap();
      assert_eq!(a, RestartParameters::default());

      let b = builder.restart_parameters(&resolver.module_chain("b").unwrap()).unwrap();
      assert!(b.on_vcap_application_change);
      assert!(!b.on_vcap_services_change);
      assert!(b.on_user_provided_change);

      let c = builder.restart_parameters(&resolver.module_chain("c").unwrap());
      assert!(matches!(c, Err(ContentError::InvalidType { .. })));
    }
  }
}
