//! Platform-visible names for applications and services.
//!
//! Names can be namespaced (as a prefix, or as a suffix placed before any
//! blue/green marker) and are shortened to the platform limits by truncating
//! and appending a stable digest of the full name. The same input always
//! yields the same name.

use tracing::debug;
use uuid::Uuid;

use crate::config::ModelConfig;
use crate::consts::*;
use crate::descriptor::{DeploymentDescriptor, Module, Resource, ResourceKind};
use crate::error::ContentError;
use crate::params::ParameterChain;
use crate::util::hash::hash_bytes;

/// Shorten `name` to at most `max_length` characters.
///
/// Names within the limit are returned unchanged. Longer names keep their
/// first characters and end with the first digest characters of the full
/// name, so distinct long names stay distinct.
pub fn shortened(name: &str, max_length: usize) -> Result<String, ContentError> {
  if name.chars().count() <= max_length {
    return Ok(name.to_string());
  }
  if max_length < NAME_DIGEST_LEN {
    return Err(ContentError::CannotShortenName {
      name: name.to_string(),
      max_length,
    });
  }
  let digest = hash_bytes(name.as_bytes());
  let mut result: String = name.chars().take(max_length - NAME_DIGEST_LEN).collect();
  result.push_str(&digest[..NAME_DIGEST_LEN]);
  Ok(result)
}

/// Apply a namespace to `name` and fit the result into `max_length`.
pub fn namespaced_name(
  name: &str,
  namespace: Option<&str>,
  apply_namespace: bool,
  as_suffix: bool,
  max_length: usize,
) -> Result<String, ContentError> {
  let name = match namespace.filter(|ns| !ns.is_empty() && apply_namespace) {
    Some(ns) if as_suffix => with_namespace_suffix(name, ns, max_length)?,
    Some(ns) => format!("{ns}{NAMESPACE_SEPARATOR}{name}"),
    None => name.to_string(),
  };
  shortened(&name, max_length)
}

pub fn valid_application_name(
  name: &str,
  namespace: Option<&str>,
  apply_namespace: bool,
  as_suffix: bool,
) -> Result<String, ContentError> {
  namespaced_name(name, namespace, apply_namespace, as_suffix, APP_NAME_MAX_LENGTH)
}

pub fn valid_service_name(
  name: &str,
  namespace: Option<&str>,
  apply_namespace: bool,
  as_suffix: bool,
) -> Result<String, ContentError> {
  namespaced_name(name, namespace, apply_namespace, as_suffix, SERVICE_NAME_MAX_LENGTH)
}

fn with_namespace_suffix(name: &str, namespace: &str, max_length: usize) -> Result<String, ContentError> {
  let suffix = format!("{NAMESPACE_SEPARATOR}{namespace}");
  // Leave room for the longest blue/green marker
  let budget = max_length.saturating_sub(suffix.chars().count() + GREEN_SUFFIX.len());
  let short = shortened(name, budget)?;

  let marker = [IDLE_SUFFIX, BLUE_SUFFIX, GREEN_SUFFIX]
    .into_iter()
    .find(|marker| name.ends_with(marker));

  Ok(match marker {
    Some(marker) => {
      let stem = match short.rfind(marker) {
        Some(index) => &short[..index],
        None => short.as_str(),
      };
      format!("{stem}{suffix}{marker}")
    }
    None => format!("{short}{suffix}"),
  })
}

/// A deterministic identifier derived from a name.
pub fn name_uuid(name: &str) -> Uuid {
  Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

/// The platform-visible application name of a module.
///
/// `app-name`, then `default-app-name`, then the module name, namespaced when
/// namespaces are enabled.
pub fn application_name(
  module: &Module,
  chain: &ParameterChain<'_>,
  config: &ModelConfig,
  descriptor: &DeploymentDescriptor,
) -> Result<String, ContentError> {
  let short = match chain.get_str(APP_NAME)? {
    Some(name) => name,
    None => chain.get_str(DEFAULT_APP_NAME)?.unwrap_or(&module.name),
  };
  valid_application_name(
    short,
    Some(config.namespace_for(descriptor)),
    config.use_namespaces,
    config.namespace_as_suffix,
  )
}

/// Computes the platform-visible name of service resources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceNameMapper {
  namespace: Option<String>,
  use_namespaces: bool,
  use_namespaces_for_services: bool,
  as_suffix: bool,
}

impl ServiceNameMapper {
  pub fn new(
    namespace: Option<String>,
    use_namespaces: bool,
    use_namespaces_for_services: bool,
    as_suffix: bool,
  ) -> Self {
    Self {
      namespace,
      use_namespaces,
      use_namespaces_for_services,
      as_suffix,
    }
  }

  pub fn from_config(config: &ModelConfig, descriptor: &DeploymentDescriptor) -> Self {
    Self::new(
      Some(config.namespace_for(descriptor).to_string()),
      config.use_namespaces,
      config.use_namespaces_for_services,
      config.namespace_as_suffix,
    )
  }

  /// The declared name of a resource before namespacing.
  ///
  /// `service-name` wins over `default-service-name`, which wins over the
  /// resource name.
  pub fn short_name<'a>(&self, resource: &'a Resource) -> &'a str {
    [SERVICE_NAME, DEFAULT_SERVICE_NAME]
      .into_iter()
      .find_map(|key| resource.parameters.get(key).and_then(|v| v.as_str()))
      .unwrap_or(&resource.name)
  }

  /// The platform-visible name of a resource.
  ///
  /// Existing services are referenced by their declared name and are never
  /// namespaced.
  pub fn map_name(&self, resource: &Resource) -> Result<String, ContentError> {
    let short = self.short_name(resource);
    if resource.service_kind()? == Some(ResourceKind::ExistingService) {
      return Ok(short.to_string());
    }
    let name = valid_service_name(
      short,
      self.namespace.as_deref(),
      self.use_namespaces && self.use_namespaces_for_services,
      self.as_suffix,
    )?;
    if name != short {
      debug!(resource = %resource.name, service = %name, "mapped service name");
    }
    Ok(name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn resource(name: &str, kind: &str) -> Resource {
    let mut resource = Resource {
      name: name.to_string(),
      ..Default::default()
    };
    resource.parameters.insert(TYPE.to_string(), json!(kind));
    resource
  }

  // ==========================================================================
  // Shortening
  // ==========================================================================

  mod shortening {
    use super::*;

    #[test]
    fn short_names_are_unchanged() {
      assert_eq!(shortened("db", 50).unwrap(), "db");
    }

    #[test]
    fn long_names_end_with_digest() {
      let long = "a".repeat(60);
      let short = shortened(&long, 50).unwrap();
      assert_eq!(short.len(), 50);
      assert!(short.starts_with(&"a".repeat(42)));
      assert_eq!(&short[42..], &hash_bytes(long.as_bytes())[..NAME_DIGEST_LEN]);
    }

    #[test]
    fn distinct_long_names_stay_distinct() {
      let a = format!("{}-one", "x".repeat(60));
      let b = format!("{}-two", "x".repeat(60));
      assert_ne!(shortened(&a, 50).unwrap(), shortened(&b, 50).unwrap());
    }

    #[test]
    fn limit_below_digest_length_is_error() {
      let err = shortened("abcdefghijkl", 4).unwrap_err();
      assert!(matches!(err, ContentError::CannotShortenName { max_length: 4, .. }));
    }
  }

  // ==========================================================================
  // Namespacing
  // ==========================================================================

  mod namespacing {
    use super::*;

    #[test]
    fn prefix_mode() {
      assert_eq!(
        namespaced_name("db", Some("shop"), true, false, 50).unwrap(),
        "shop-db"
      );
    }

    #[test]
    fn disabled_or_empty_namespace_is_ignored() {
      assert_eq!(namespaced_name("db", Some("shop"), false, false, 50).unwrap(), "db");
      assert_eq!(namespaced_name("db", Some(""), true, false, 50).unwrap(), "db");
      assert_eq!(namespaced_name("db", None, true, false, 50).unwrap(), "db");
    }

    #[test]
    fn suffix_mode_goes_before_blue_green_marker() {
      assert_eq!(
        namespaced_name("web", Some("shop"), true, true, 1024).unwrap(),
        "web-shop"
      );
      assert_eq!(
        namespaced_name("web-idle", Some("shop"), true, true, 1024).unwrap(),
        "web-shop-idle"
      );
      assert_eq!(
        namespaced_name("web-green", Some("shop"), true, true, 1024).unwrap(),
        "web-shop-green"
      );
    }

    #[test]
    fn suffix_mode_respects_limit() {
      let name = namespaced_name(&"s".repeat(60), Some("shop"), true, true, 50).unwrap();
      assert!(name.len() <= 50);
      assert!(name.ends_with("-shop"));
    }

    #[test]
    fn uuid_is_stable() {
      assert_eq!(name_uuid("shop:web-api"), name_uuid("shop:web-api"));
      assert_ne!(name_uuid("shop:web-api"), name_uuid("shop:db"));
    }
  }

  // ==========================================================================
  // Service name mapper
  // ==========================================================================

  mod mapper {
    use super::*;

    fn all_flag_combinations() -> Vec<ServiceNameMapper> {
      let mut mappers = Vec::new();
      for use_namespaces in [false, true] {
        for for_services in [false, true] {
          for as_suffix in [false, true] {
            mappers.push(ServiceNameMapper::new(
              Some("shop".to_string()),
              use_namespaces,
              for_services,
              as_suffix,
            ));
          }
        }
      }
      mappers
    }

    #[test]
    fn existing_service_keeps_its_name_for_all_flags() {
      let mut existing = resource("shared-db", "org.cloudfoundry.existing-service");
      for mapper in all_flag_combinations() {
        assert_eq!(mapper.map_name(&existing).unwrap(), "shared-db");
      }

      existing
        .parameters
        .insert(SERVICE_NAME.to_string(), json!("legacy-postgres"));
      for mapper in all_flag_combinations() {
        assert_eq!(mapper.map_name(&existing).unwrap(), "legacy-postgres");
      }
    }

    #[test]
    fn services_need_both_switches() {
      let db = resource("db", "managed-service");
      let only_global = ServiceNameMapper::new(Some("shop".to_string()), true, false, false);
      let both = ServiceNameMapper::new(Some("shop".to_string()), true, true, false);
      let only_services = ServiceNameMapper::new(Some("shop".to_string()), false, true, false);

      assert_eq!(only_global.map_name(&db).unwrap(), "db");
      assert_eq!(only_services.map_name(&db).unwrap(), "db");
      assert_eq!(both.map_name(&db).unwrap(), "shop-db");
    }

    #[test]
    fn service_name_parameter_overrides_resource_name() {
      let mut db = resource("db", "managed-service");
      db.parameters
        .insert(DEFAULT_SERVICE_NAME.to_string(), json!("db-default"));
      let mapper = ServiceNameMapper::default();
      assert_eq!(mapper.map_name(&db).unwrap(), "db-default");

      db.parameters.insert(SERVICE_NAME.to_string(), json!("orders-db"));
      assert_eq!(mapper.map_name(&db).unwrap(), "orders-db");
    }

    #[test]
    fn mapping_is_deterministic() {
      let db = resource(&"d".repeat(70), "managed-service");
      let mapper = ServiceNameMapper::new(Some("shop".to_string()), true, true, false);
      assert_eq!(mapper.map_name(&db).unwrap(), mapper.map_name(&db).unwrap());
      assert_eq!(mapper.map_name(&db).unwrap().len(), SERVICE_NAME_MAX_LENGTH);
    }

    #[test]
    fn application_names_use_global_switch() {
      let d = DeploymentDescriptor::from_yaml_str(
        r#"
ID: shop
version: 1.0.0
modules:
  - name: web
    parameters:
      default-app-name: web
  - name: api
    parameters:
      app-name: orders-api
"#,
      )
      .unwrap();
      let resolver = crate::params::ParameterChainResolver::new(&d);
      let config = ModelConfig {
        use_namespaces: true,
        ..Default::default()
      };

      let web = d.module("web").unwrap();
      let name = application_name(web, &resolver.for_module(web), &config, &d).unwrap();
      assert_eq!(name, "shop-web");

      let api = d.module("api").unwrap();
      let name = application_name(api, &resolver.for_module(api), &ModelConfig::default(), &d).unwrap();
      assert_eq!(name, "orders-api");
    }
  }
}
