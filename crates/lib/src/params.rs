//! Parameter chains and override resolution.
//!
//! A parameter chain is the ordered list of scopes that apply to a module,
//! resource or dependency, from the most general (descriptor parameters) to
//! the most specific (the dependency's own parameters). Lookups scan the chain
//! from the end, so a more specific scope always shadows a less specific one.
//!
//! # Example
//!
//! ```
//! use cloudmodel_lib::descriptor::Parameters;
//! use cloudmodel_lib::params::ParameterChain;
//! use serde_json::json;
//!
//! let global: Parameters = [("memory".to_string(), json!("1G"))].into();
//! let module: Parameters = [("memory".to_string(), json!("256M"))].into();
//!
//! let chain = ParameterChain::new("web", vec![&global, &module]);
//! assert_eq!(chain.get_str("memory").unwrap(), Some("256M"));
//! ```

use std::collections::BTreeSet;

use serde_json::Value;
use tracing::warn;

use crate::descriptor::{DeploymentDescriptor, Module, Parameters, RequiredDependency, Resource};
use crate::error::ContentError;

/// Ordered parameter scopes for one module, resource or dependency.
#[derive(Debug, Clone)]
pub struct ParameterChain<'a> {
  owner: String,
  scopes: Vec<&'a Parameters>,
}

impl<'a> ParameterChain<'a> {
  /// Create a chain from scopes ordered most general first.
  pub fn new(owner: impl Into<String>, scopes: Vec<&'a Parameters>) -> Self {
    Self {
      owner: owner.into(),
      scopes,
    }
  }

  /// Name of the module, resource or dependency this chain belongs to.
  pub fn owner(&self) -> &str {
    &self.owner
  }

  pub fn scopes(&self) -> &[&'a Parameters] {
    &self.scopes
  }

  /// Append a more specific scope.
  pub fn with_scope(mut self, owner: impl Into<String>, scope: &'a Parameters) -> Self {
    self.owner = owner.into();
    self.scopes.push(scope);
    self
  }

  /// The most specific value for `key`.
  pub fn get(&self, key: &str) -> Option<&'a Value> {
    self.scopes.iter().rev().copied().find_map(|scope| scope.get(key))
  }

  pub fn contains(&self, key: &str) -> bool {
    self.get(key).is_some()
  }

  pub fn get_str(&self, key: &str) -> Result<Option<&'a str>, ContentError> {
    match self.get(key) {
      None | Some(Value::Null) => Ok(None),
      Some(Value::String(s)) => Ok(Some(s.as_str())),
      Some(_) => Err(self.invalid(key, "string")),
    }
  }

  pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ContentError> {
    match self.get(key) {
      None | Some(Value::Null) => Ok(None),
      Some(Value::Bool(b)) => Ok(Some(*b)),
      Some(Value::String(s)) if s == "true" => Ok(Some(true)),
      Some(Value::String(s)) if s == "false" => Ok(Some(false)),
      Some(_) => Err(self.invalid(key, "boolean")),
    }
  }

  pub fn bool_or(&self, key: &str, default: bool) -> Result<bool, ContentError> {
    Ok(self.get_bool(key)?.unwrap_or(default))
  }

  /// Integer value; numeric strings are accepted.
  pub fn get_i64(&self, key: &str) -> Result<Option<i64>, ContentError> {
    match self.get(key) {
      None | Some(Value::Null) => Ok(None),
      Some(value) => value_as_i64(value)
        .map(Some)
        .ok_or_else(|| self.invalid(key, "integer")),
    }
  }

  /// A map value, or `None` when absent.
  pub fn get_map(&self, key: &str) -> Result<Option<&'a serde_json::Map<String, Value>>, ContentError> {
    match self.get(key) {
      None | Some(Value::Null) => Ok(None),
      Some(Value::Object(map)) => Ok(Some(map)),
      Some(_) => Err(self.invalid(key, "map")),
    }
  }

  /// A list value, or `None` when absent.
  pub fn get_list(&self, key: &str) -> Result<Option<&'a Vec<Value>>, ContentError> {
    match self.get(key) {
      None | Some(Value::Null) => Ok(None),
      Some(Value::Array(list)) => Ok(Some(list)),
      Some(_) => Err(self.invalid(key, "list")),
    }
  }

  /// List of strings; a single string is treated as a one-element list.
  pub fn get_string_list(&self, key: &str) -> Result<Vec<String>, ContentError> {
    match self.get(key) {
      None | Some(Value::Null) => Ok(Vec::new()),
      Some(Value::String(s)) => Ok(vec![s.clone()]),
      Some(Value::Array(items)) => items
        .iter()
        .map(|item| match item {
          Value::String(s) => Ok(s.clone()),
          _ => Err(self.invalid(key, "list of strings")),
        })
        .collect(),
      Some(_) => Err(self.invalid(key, "list of strings")),
    }
  }

  /// Values of a singular/plural parameter pair (`host`/`hosts`).
  ///
  /// The most specific scope declaring either name wins. Within that scope
  /// the singular value comes first, followed by the plural list.
  pub fn get_all(&self, singular: &str, plural: &str) -> Result<Vec<&'a Value>, ContentError> {
    let Some(scope) = self
      .scopes
      .iter()
      .rev()
      .copied()
      .find(|scope| scope.contains_key(singular) || scope.contains_key(plural))
    else {
      return Ok(Vec::new());
    };

    let mut result = Vec::new();
    if let Some(value) = scope.get(singular).filter(|v| !v.is_null()) {
      result.push(value);
    }
    match scope.get(plural) {
      None | Some(Value::Null) => {}
      Some(Value::Array(items)) => result.extend(items.iter()),
      Some(_) => return Err(self.invalid(plural, "list")),
    }
    Ok(result)
  }

  /// String values of a singular/plural parameter pair.
  pub fn get_all_strings(&self, singular: &str, plural: &str) -> Result<Vec<String>, ContentError> {
    self
      .get_all(singular, plural)?
      .into_iter()
      .map(|value| match value {
        Value::String(s) => Ok(s.clone()),
        _ => Err(self.invalid(plural, "list of strings")),
      })
      .collect()
  }

  /// Integer values of a singular/plural parameter pair.
  pub fn get_all_i64(&self, singular: &str, plural: &str) -> Result<Vec<i64>, ContentError> {
    self
      .get_all(singular, plural)?
      .into_iter()
      .map(|value| value_as_i64(value).ok_or_else(|| self.invalid(plural, "list of integers")))
      .collect()
  }

  /// Flatten the chain into one scope; more specific scopes shadow less
  /// specific ones.
  pub fn merge_all(&self) -> Parameters {
    let mut merged = Parameters::new();
    for scope in &self.scopes {
      for (key, value) in scope.iter() {
        merged.insert(key.clone(), value.clone());
      }
    }
    merged
  }

  /// Keys of the merged chain that are not in any of the `known` sets.
  pub fn unsupported_keys(&self, known: &[&[&str]]) -> Vec<String> {
    let known: BTreeSet<&str> = known.iter().flat_map(|set| set.iter().copied()).collect();
    self
      .merge_all()
      .into_keys()
      .filter(|key| !known.contains(key.as_str()))
      .collect()
  }

  /// Log a warning for every unsupported key and return them.
  ///
  /// Never fails: unknown parameters are tolerated.
  pub fn warn_unsupported(&self, known: &[&[&str]]) -> Vec<String> {
    let unsupported = self.unsupported_keys(known);
    for key in &unsupported {
      warn!(owner = %self.owner, parameter = %key, "unsupported parameter");
    }
    unsupported
  }

  fn invalid(&self, key: &str, expected: &'static str) -> ContentError {
    ContentError::invalid_type(&self.owner, key, expected)
  }
}

fn value_as_i64(value: &Value) -> Option<i64> {
  match value {
    Value::Number(n) => n.as_i64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

/// Builds parameter chains for the modules, resources and dependencies of a
/// descriptor.
#[derive(Debug, Clone, Copy)]
pub struct ParameterChainResolver<'a> {
  descriptor: &'a DeploymentDescriptor,
}

impl<'a> ParameterChainResolver<'a> {
  pub fn new(descriptor: &'a DeploymentDescriptor) -> Self {
    Self { descriptor }
  }

  pub fn descriptor(&self) -> &'a DeploymentDescriptor {
    self.descriptor
  }

  /// Chain for a module looked up by name.
  pub fn module_chain(&self, name: &str) -> Option<ParameterChain<'a>> {
    self.descriptor.module(name).map(|m| self.for_module(m))
  }

  /// Chain for a resource looked up by name.
  pub fn resource_chain(&self, name: &str) -> Option<ParameterChain<'a>> {
    self.descriptor.resource(name).map(|r| self.for_resource(r))
  }

  /// Chain for a required dependency of a module, both looked up by name.
  pub fn dependency_chain(&self, module: &str, dependency: &str) -> Option<ParameterChain<'a>> {
    let module = self.descriptor.module(module)?;
    let dependency = module.requires.iter().find(|d| d.name == dependency)?;
    Some(self.for_dependency(module, dependency))
  }

  pub fn for_module(&self, module: &'a Module) -> ParameterChain<'a> {
    ParameterChain::new(&module.name, vec![&self.descriptor.parameters, &module.parameters])
  }

  pub fn for_resource(&self, resource: &'a Resource) -> ParameterChain<'a> {
    ParameterChain::new(&resource.name, vec![&self.descriptor.parameters, &resource.parameters])
  }

  pub fn for_dependency(&self, module: &'a Module, dependency: &'a RequiredDependency) -> ParameterChain<'a> {
    self
      .for_module(module)
      .with_scope(format!("{}#{}", module.name, dependency.name), &dependency.parameters)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn scope(pairs: &[(&str, Value)]) -> Parameters {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
  }

  fn descriptor() -> DeploymentDescriptor {
    DeploymentDescriptor::from_yaml_str(
      r#"
ID: com.example
version: 1.0.0
parameters:
  memory: 1G
  org: acme
modules:
  - name: web
    parameters:
      memory: 256M
      instances: "3"
      hosts: [a, b]
    requires:
      - name: db
        parameters:
          memory: 64M
          env-var-name: DB
resources:
  - name: db
    parameters:
      service: postgresql
"#,
    )
    .unwrap()
  }

  // ==========================================================================
  // Lookup
  // ==========================================================================

  mod lookup {
    use super::*;

    #[test]
    fn most_specific_scope_wins() {
      let d = descriptor();
      let resolver = ParameterChainResolver::new(&d);

      let module = resolver.module_chain("web").unwrap();
      assert_eq!(module.get_str("memory").unwrap(), Some("256M"));
      assert_eq!(module.get_str("org").unwrap(), Some("acme"));

      let dependency = resolver.dependency_chain("web", "db").unwrap();
      assert_eq!(dependency.get_str("memory").unwrap(), Some("64M"));
      assert_eq!(dependency.owner(), "web#db");
    }

    #[test]
    fn missing_names_yield_none() {
      let d = descriptor();
      let resolver = ParameterChainResolver::new(&d);
      assert!(resolver.module_chain("nope").is_none());
      assert!(resolver.resource_chain("nope").is_none());
      assert!(resolver.dependency_chain("web", "nope").is_none());
    }

    #[test]
    fn absent_key_is_none() {
      let d = descriptor();
      let chain = ParameterChainResolver::new(&d).resource_chain("db").unwrap();
      assert_eq!(chain.get_str("service-plan").unwrap(), None);
      assert!(!chain.contains("service-plan"));
    }

    #[test]
    fn numeric_strings_are_integers() {
      let d = descriptor();
      let chain = ParameterChainResolver::new(&d).module_chain("web").unwrap();
      assert_eq!(chain.get_i64("instances").unwrap(), Some(3));
    }

    #[test]
    fn wrong_type_names_owner_and_parameter() {
      let global = scope(&[("no-route", json!("maybe"))]);
      let chain = ParameterChain::new("web", vec![&global]);
      let err = chain.get_bool("no-route").unwrap_err();
      assert_eq!(
        err,
        ContentError::InvalidType {
          owner: "web".to_string(),
          parameter: "no-route".to_string(),
          expected: "boolean",
        }
      );
    }

    #[test]
    fn null_is_treated_as_absent() {
      let global = scope(&[("memory", json!("1G"))]);
      let module = scope(&[("memory", Value::Null)]);
      let chain = ParameterChain::new("web", vec![&global, &module]);
      assert_eq!(chain.get_str("memory").unwrap(), None);
    }
  }

  // ==========================================================================
  // Singular / plural pairs
  // ==========================================================================

  mod plural {
    use super::*;

    #[test]
    fn singular_then_plural_from_same_scope() {
      let module = scope(&[("host", json!("x")), ("hosts", json!(["y", "z"]))]);
      let chain = ParameterChain::new("web", vec![&module]);
      assert_eq!(chain.get_all_strings("host", "hosts").unwrap(), vec!["x", "y", "z"]);
    }

    #[test]
    fn more_specific_scope_replaces_whole_pair() {
      let global = scope(&[("hosts", json!(["g1", "g2"]))]);
      let module = scope(&[("host", json!("m"))]);
      let chain = ParameterChain::new("web", vec![&global, &module]);
      assert_eq!(chain.get_all_strings("host", "hosts").unwrap(), vec!["m"]);
    }

    #[test]
    fn ports_accept_numbers_and_strings() {
      let module = scope(&[("ports", json!([8080, "9090"]))]);
      let chain = ParameterChain::new("web", vec![&module]);
      assert_eq!(chain.get_all_i64("port", "ports").unwrap(), vec![8080, 9090]);
    }

    #[test]
    fn plural_must_be_a_list() {
      let module = scope(&[("hosts", json!("a"))]);
      let chain = ParameterChain::new("web", vec![&module]);
      assert!(chain.get_all("host", "hosts").is_err());
    }
  }

  // ==========================================================================
  // Merging and unsupported parameters
  // ==========================================================================

  mod merge {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn merge_all_shadows_general_values() {
      let d = descriptor();
      let chain = ParameterChainResolver::new(&d).module_chain("web").unwrap();
      let merged = chain.merge_all();
      assert_eq!(merged["memory"], json!("256M"));
      assert_eq!(merged["org"], json!("acme"));
      assert_eq!(merged.len(), 4);
    }

    #[test]
    fn unsupported_keys_are_the_remaining_keys() {
      let d = descriptor();
      let chain = ParameterChainResolver::new(&d).module_chain("web").unwrap();
      let known: &[&str] = &["memory", "instances", "org"];
      assert_eq!(chain.unsupported_keys(&[known]), vec!["hosts".to_string()]);
    }

    #[test]
    #[traced_test]
    fn unsupported_keys_are_logged_as_warnings() {
      let module = scope(&[("colour", json!("blue")), ("memory", json!("1G"))]);
      let chain = ParameterChain::new("web", vec![&module]);
      let unsupported = chain.warn_unsupported(&[&["memory"]]);
      assert_eq!(unsupported, vec!["colour".to_string()]);
      assert!(logs_contain("unsupported parameter"));
      assert!(logs_contain("colour"));
    }

    #[test]
    fn empty_chain_merges_to_empty_scope() {
      let chain = ParameterChain::new("web", Vec::new());
      assert!(chain.merge_all().is_empty());
      assert!(chain.unsupported_keys(&[]).is_empty());
    }
  }
}
