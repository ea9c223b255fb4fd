//! Application environment types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The environment of one application.
///
/// Keys are kept sorted so the environment, and everything derived from it,
/// serializes identically for identical input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment(pub BTreeMap<String, Value>);

impl Environment {
  pub fn get(&self, key: &str) -> Option<&Value> {
    self.0.get(key)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.0.contains_key(key)
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.0.keys().map(String::as_str)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Render every value as an environment variable string.
  ///
  /// Strings are used as they are; everything else is JSON, pretty printed
  /// on request.
  pub fn to_env_strings(&self, pretty: bool) -> BTreeMap<String, String> {
    self
      .0
      .iter()
      .map(|(key, value)| {
        let rendered = match value {
          Value::String(s) => s.clone(),
          other if pretty => format!("{other:#}"),
          other => other.to_string(),
        };
        (key.clone(), rendered)
      })
      .collect()
  }
}

/// Which environment changes restart the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RestartParameters {
  pub on_vcap_application_change: bool,
  pub on_vcap_services_change: bool,
  pub on_user_provided_change: bool,
}

impl Default for RestartParameters {
  fn default() -> Self {
    Self {
      on_vcap_application_change: true,
      on_vcap_services_change: true,
      on_user_provided_change: true,
    }
  }
}
