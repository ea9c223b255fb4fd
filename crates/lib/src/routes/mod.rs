//! Route, domain and port computation.
//!
//! Routes come from explicit `route`/`routes` parameters when present, and
//! are otherwise assembled from hosts, domains and ports:
//!
//! - host based: `host.domain`
//! - port based: `domain:port`, used with port-based routing, for tcp/tcps
//!   modules, or when no host is available
//! - bare: `domain`, when there are domains but neither hosts nor ports
//!
//! `route-path` is appended to assembled routes. The result keeps first-seen
//! order without duplicates.

mod types;
pub mod uri;

pub use types::*;

use tracing::debug;

use crate::config::ModelConfig;
use crate::consts::*;
use crate::deployed::DeployedMta;
use crate::descriptor::Module;
use crate::error::ContentError;
use crate::params::ParameterChain;
use crate::placeholder::{PlaceholderContext, substitute_all};
use crate::util::dedup_stable;

/// Computes routes, domains and ports of modules.
#[derive(Debug, Clone, Copy)]
pub struct RouteModelBuilder<'a> {
  config: &'a ModelConfig,
  placeholders: &'a PlaceholderContext,
  deployed: Option<&'a DeployedMta>,
}

impl<'a> RouteModelBuilder<'a> {
  pub fn new(config: &'a ModelConfig, placeholders: &'a PlaceholderContext) -> Self {
    Self {
      config,
      placeholders,
      deployed: None,
    }
  }

  /// Use previously deployed state for route retention.
  pub fn with_deployed(mut self, deployed: Option<&'a DeployedMta>) -> Self {
    self.deployed = deployed;
    self
  }

  /// The single port type of a module.
  ///
  /// `tcp` and `tcps` are mutually exclusive; neither means HTTP.
  pub fn port_type(&self, chain: &ParameterChain<'_>) -> Result<PortType, ContentError> {
    let tcp = chain.bool_or(TCP, false)?;
    let tcps = chain.bool_or(TCPS, false)?;
    match (tcp, tcps) {
      (true, true) => Err(ContentError::InvalidTcpRoute {
        module: chain.owner().to_string(),
      }),
      (true, false) => Ok(PortType::Tcp),
      (false, true) => Ok(PortType::Tcps),
      (false, false) => Ok(PortType::Http),
    }
  }

  /// Live URIs of a module.
  ///
  /// With `keep-existing-routes` (module parameter or global flag) the URIs
  /// of the deployed application are appended.
  pub fn uris(&self, module: &Module, chain: &ParameterChain<'_>) -> Result<Vec<String>, ContentError> {
    let mut uris = self.compute_uris(chain, RoutingParameterSet::Default)?;

    if chain.bool_or(KEEP_EXISTING_ROUTES, self.config.keep_existing_routes)? {
      match self.deployed.and_then(|d| d.find_application(&module.name)) {
        Some(app) => {
          debug!(module = %module.name, kept = app.uris.len(), "keeping existing routes");
          uris.extend(app.uris.iter().cloned());
        }
        None => debug!(module = %module.name, "no deployed application, nothing to keep"),
      }
    }

    Ok(dedup_stable(uris))
  }

  /// Idle URIs of a module, used before a blue/green swap.
  pub fn idle_uris(&self, chain: &ParameterChain<'_>) -> Result<Vec<String>, ContentError> {
    self.compute_uris(chain, RoutingParameterSet::Idle)
  }

  /// Domains the module's routes live on.
  pub fn domains(&self, chain: &ParameterChain<'_>) -> Result<Vec<String>, ContentError> {
    let domains = self.domain_names(chain, RoutingParameterSet::Default)?;
    Ok(substitute_all(&domains, self.placeholders))
  }

  /// Ports the application listens on, all of the module's port type.
  pub fn ports(&self, chain: &ParameterChain<'_>) -> Result<Vec<ApplicationPort>, ContentError> {
    let port_type = self.port_type(chain)?;
    Ok(
      self
        .port_numbers(chain, RoutingParameterSet::Default)?
        .into_iter()
        .map(|port| ApplicationPort { port, port_type })
        .collect(),
    )
  }

  fn compute_uris(&self, chain: &ParameterChain<'_>, set: RoutingParameterSet) -> Result<Vec<String>, ContentError> {
    if chain.bool_or(NO_ROUTE, false)? {
      return Ok(Vec::new());
    }

    let routes = self.explicit_routes(chain, set)?;
    if !routes.is_empty() {
      return Ok(dedup_stable(substitute_all(&routes, self.placeholders)));
    }

    let mut hosts = self.hosts(chain, set)?;
    let mut domains = self.domain_names(chain, set)?;
    let ports = self.port_numbers(chain, set)?;

    if domains.is_empty() {
      // Hosts double as domains when no domain is known
      domains = std::mem::take(&mut hosts);
    }

    let port_type = self.port_type(chain)?;
    let protocol = match port_type {
      PortType::Http => chain
        .get_str(PROTOCOL)?
        .or(self.placeholders.protocol.as_deref())
        .unwrap_or("https")
        .to_string(),
      other => other.as_str().to_string(),
    };
    let port_based = (self.config.port_based_routing || hosts.is_empty() || port_type != PortType::Http) && !ports.is_empty();
    let route_path = chain.get_str(ROUTE_PATH)?.unwrap_or_default();

    let mut uris = Vec::new();
    for domain in &domains {
      if port_based {
        uris.extend(ports.iter().map(|port| format!("{domain}:{port}{route_path}")));
      } else if !hosts.is_empty() {
        uris.extend(hosts.iter().map(|host| format!("{host}.{domain}{route_path}")));
      } else {
        uris.push(format!("{domain}{route_path}"));
      }
    }

    let uris: Vec<String> = dedup_stable(uris)
      .into_iter()
      .map(|uri| {
        if self.config.platform_type.includes_protocol() {
          uri::with_scheme(&protocol, &uri)
        } else {
          uri
        }
      })
      .collect();

    Ok(dedup_stable(substitute_all(&uris, self.placeholders)))
  }

  /// Routes from `route` and the entries of `routes`.
  ///
  /// `routes` entries are maps keyed by the route parameter name; plain
  /// strings are accepted too.
  fn explicit_routes(&self, chain: &ParameterChain<'_>, set: RoutingParameterSet) -> Result<Vec<String>, ContentError> {
    let names = set.names();
    let mut routes: Vec<String> = chain.get_str(names.route)?.map(str::to_string).into_iter().collect();

    for entry in chain.get_list(names.routes)?.into_iter().flatten() {
      let route = match entry {
        serde_json::Value::String(s) => Some(s.as_str()),
        serde_json::Value::Object(map) => map
          .get(names.route)
          .or_else(|| map.get(ROUTE))
          .and_then(|v| v.as_str()),
        _ => return Err(ContentError::invalid_type(chain.owner(), names.routes, "list of routes")),
      };
      routes.extend(route.map(str::to_string));
    }
    Ok(routes)
  }

  fn hosts(&self, chain: &ParameterChain<'_>, set: RoutingParameterSet) -> Result<Vec<String>, ContentError> {
    if chain.bool_or(NO_HOSTNAME, false)? {
      return Ok(Vec::new());
    }
    let names = set.names();
    let mut hosts = chain.get_all_strings(names.host, names.hosts)?;
    if hosts.is_empty() {
      hosts.extend(chain.get_str(names.default_host)?.map(str::to_string));
    }
    Ok(hosts)
  }

  fn domain_names(&self, chain: &ParameterChain<'_>, set: RoutingParameterSet) -> Result<Vec<String>, ContentError> {
    let names = set.names();
    let routes = self.explicit_routes(chain, set)?;
    let mut domains = if routes.is_empty() {
      chain.get_all_strings(names.domain, names.domains)?
    } else {
      dedup_stable(routes.iter().filter_map(|r| uri::domain(r)))
    };

    if domains.is_empty() {
      let default = match chain.get_str(names.default_domain)? {
        Some(domain) => Some(domain),
        // Idle routes share the default domain unless one is configured
        None if set == RoutingParameterSet::Idle => chain.get_str(DEFAULT_DOMAIN)?,
        None => None,
      };
      domains.extend(default.map(str::to_string));
    }
    Ok(domains)
  }

  fn port_numbers(&self, chain: &ParameterChain<'_>, set: RoutingParameterSet) -> Result<Vec<u16>, ContentError> {
    let names = set.names();
    let routes = self.explicit_routes(chain, set)?;
    let mut ports = if routes.is_empty() {
      chain
        .get_all_i64(names.port, names.ports)?
        .into_iter()
        .map(|port| u16::try_from(port).map_err(|_| ContentError::invalid_type(chain.owner(), names.ports, "port number")))
        .collect::<Result<Vec<_>, _>>()?
    } else {
      dedup_stable(routes.iter().filter_map(|r| uri::port(r)))
    };

    if ports.is_empty() {
      let default = chain.get_i64(names.default_port)?.filter(|p| *p != 0);
      if let Some(port) = default {
        ports.push(u16::try_from(port).map_err(|_| ContentError::invalid_type(chain.owner(), names.default_port, "port number"))?);
      }
    }
    Ok(ports)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::PlatformType;
  use crate::deployed::DeployedMtaApplication;
  use crate::descriptor::Parameters;
  use crate::util::testutil::system_parameters;
  use serde_json::{Value, json};

  fn scope(pairs: &[(&str, Value)]) -> Parameters {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
  }

  fn global() -> Parameters {
    scope(&[
      (DEFAULT_DOMAIN, json!("cfapps.example.com")),
      (PROTOCOL, json!("https")),
    ])
  }

  fn module(name: &str) -> Module {
    Module {
      name: name.to_string(),
      ..Default::default()
    }
  }

  fn uris_for(config: &ModelConfig, module_params: &Parameters) -> Result<Vec<String>, ContentError> {
    let global = global();
    let chain = ParameterChain::new("web", vec![&global, module_params]);
    let ctx = system_parameters().placeholder_context();
    RouteModelBuilder::new(config, &ctx).uris(&module("web"), &chain)
  }

  // ==========================================================================
  // URI assembly
  // ==========================================================================

  mod assembly {
    use super::*;

    #[test]
    fn default_host_and_domain() {
      let params = scope(&[(DEFAULT_HOST, json!("acme-dev-web"))]);
      assert_eq!(
        uris_for(&ModelConfig::default(), &params).unwrap(),
        vec!["acme-dev-web.cfapps.example.com"]
      );
    }

    #[test]
    fn hosts_times_domains_with_route_path() {
      let params = scope(&[
        (HOSTS, json!(["a", "b"])),
        (DOMAINS, json!(["x.com", "y.com"])),
        (ROUTE_PATH, json!("/shop")),
      ]);
      assert_eq!(
        uris_for(&ModelConfig::default(), &params).unwrap(),
        vec!["a.x.com/shop", "b.x.com/shop", "a.y.com/shop", "b.y.com/shop"]
      );
    }

    #[test]
    fn explicit_routes_take_precedence() {
      let params = scope(&[
        (HOST, json!("ignored")),
        (ROUTES, json!([{"route": "shop.example.com/api"}, {"route": "www.example.com"}])),
      ]);
      assert_eq!(
        uris_for(&ModelConfig::default(), &params).unwrap(),
        vec!["shop.example.com/api", "www.example.com"]
      );
    }

    #[test]
    fn no_route_yields_nothing() {
      let params = scope(&[(NO_ROUTE, json!(true)), (HOST, json!("web"))]);
      assert!(uris_for(&ModelConfig::default(), &params).unwrap().is_empty());
    }

    #[test]
    fn no_hostname_uses_bare_domain() {
      let params = scope(&[(NO_HOSTNAME, json!(true)), (DEFAULT_HOST, json!("web"))]);
      assert_eq!(
        uris_for(&ModelConfig::default(), &params).unwrap(),
        vec!["cfapps.example.com"]
      );
    }

    #[test]
    fn port_based_routing() {
      let params = scope(&[(HOST, json!("web")), (PORTS, json!([5000, 5001]))]);
      let config = ModelConfig {
        port_based_routing: true,
        ..Default::default()
      };
      assert_eq!(
        uris_for(&config, &params).unwrap(),
        vec!["cfapps.example.com:5000", "cfapps.example.com:5001"]
      );
      assert_eq!(
        uris_for(&ModelConfig::default(), &params).unwrap(),
        vec!["web.cfapps.example.com"]
      );
    }

    #[test]
    fn tcp_modules_use_ports() {
      let params = scope(&[(HOST, json!("web")), (TCP, json!(true)), (PORT, json!(6000))]);
      assert_eq!(
        uris_for(&ModelConfig::default(), &params).unwrap(),
        vec!["cfapps.example.com:6000"]
      );
    }

    #[test]
    fn xs2_includes_protocol() {
      let params = scope(&[(HOST, json!("web"))]);
      let config = ModelConfig {
        platform_type: PlatformType::Xs2,
        ..Default::default()
      };
      assert_eq!(
        uris_for(&config, &params).unwrap(),
        vec!["https://web.cfapps.example.com"]
      );
    }

    #[test]
    fn placeholders_in_domains_are_resolved() {
      let params = scope(&[
        (HOST, json!("web")),
        (DOMAIN, json!("{xsa-placeholder-domain-default}")),
      ]);
      assert_eq!(
        uris_for(&ModelConfig::default(), &params).unwrap(),
        vec!["web.cfapps.example.com"]
      );
    }
  }

  // ==========================================================================
  // Idle routes and route retention
  // ==========================================================================

  mod idle {
    use super::*;

    #[test]
    fn idle_uris_use_idle_parameters() {
      let global = global();
      let params = scope(&[
        (DEFAULT_HOST, json!("web")),
        (DEFAULT_IDLE_HOST, json!("web-idle")),
      ]);
      let chain = ParameterChain::new("web", vec![&global, &params]);
      let config = ModelConfig::default();
      let ctx = system_parameters().placeholder_context();
      let builder = RouteModelBuilder::new(&config, &ctx);

      assert_eq!(builder.idle_uris(&chain).unwrap(), vec!["web-idle.cfapps.example.com"]);
      assert_eq!(
        builder.uris(&module("web"), &chain).unwrap(),
        vec!["web.cfapps.example.com"]
      );
    }

    #[test]
    fn keep_existing_routes_appends_deployed_uris() {
      let global = global();
      let params = scope(&[
        (ROUTE, json!("new.example.com")),
        (KEEP_EXISTING_ROUTES, json!(true)),
      ]);
      let chain = ParameterChain::new("web", vec![&global, &params]);
      let deployed = DeployedMta {
        applications: vec![DeployedMtaApplication {
          module_name: "web".to_string(),
          name: "web".to_string(),
          uris: vec!["old.example.com".to_string(), "new.example.com".to_string()],
          ..Default::default()
        }],
        ..Default::default()
      };
      let config = ModelConfig::default();
      let ctx = system_parameters().placeholder_context();
      let builder = RouteModelBuilder::new(&config, &ctx).with_deployed(Some(&deployed));

      assert_eq!(
        builder.uris(&module("web"), &chain).unwrap(),
        vec!["new.example.com", "old.example.com"]
      );
    }

    #[test]
    fn global_flag_keeps_routes() {
      let global = global();
      let params = scope(&[(ROUTE, json!("new.example.com"))]);
      let chain = ParameterChain::new("web", vec![&global, &params]);
      let deployed = DeployedMta {
        applications: vec![DeployedMtaApplication {
          module_name: "WEB".to_string(),
          name: "web".to_string(),
          uris: vec!["old.example.com".to_string()],
          ..Default::default()
        }],
        ..Default::default()
      };
      let config = ModelConfig {
        keep_existing_routes: true,
        ..Default::default()
      };
      let ctx = system_parameters().placeholder_context();
      let builder = RouteModelBuilder::new(&config, &ctx).with_deployed(Some(&deployed));

      assert_eq!(
        builder.uris(&module("web"), &chain).unwrap(),
        vec!["new.example.com", "old.example.com"]
      );
    }
  }

  // ==========================================================================
  // Ports and domains
  // ==========================================================================

  mod ports {
    use super::*;

    fn ports_for(params: &Parameters) -> Result<Vec<ApplicationPort>, ContentError> {
      let global = global();
      let chain = ParameterChain::new("web", vec![&global, params]);
      let config = ModelConfig::default();
      let ctx = system_parameters().placeholder_context();
      RouteModelBuilder::new(&config, &ctx).ports(&chain)
    }

    #[test]
    fn tcp_and_tcps_together_is_content_error() {
      let params = scope(&[(TCP, json!(true)), (TCPS, json!(true)), (PORT, json!(5000))]);
      assert_eq!(
        ports_for(&params).unwrap_err(),
        ContentError::InvalidTcpRoute {
          module: "web".to_string()
        }
      );
    }

    #[test]
    fn ports_carry_module_type() {
      let params = scope(&[(TCPS, json!(true)), (PORTS, json!([5000, "5001"]))]);
      assert_eq!(
        ports_for(&params).unwrap(),
        vec![
          ApplicationPort {
            port: 5000,
            port_type: PortType::Tcps
          },
          ApplicationPort {
            port: 5001,
            port_type: PortType::Tcps
          },
        ]
      );
    }

    #[test]
    fn ports_from_routes_and_default_port() {
      let params = scope(&[(ROUTE, json!("tcp.example.com:7000"))]);
      assert_eq!(ports_for(&params).unwrap()[0].port, 7000);

      let params = scope(&[(DEFAULT_PORT, json!(8080))]);
      assert_eq!(ports_for(&params).unwrap()[0].port, 8080);

      assert!(ports_for(&Parameters::new()).unwrap().is_empty());
    }

    #[test]
    fn out_of_range_port_is_content_error() {
      let params = scope(&[(PORT, json!(70000))]);
      assert!(matches!(ports_for(&params), Err(ContentError::InvalidType { .. })));
    }

    #[test]
    fn domains_from_routes_or_parameters() {
      let global = global();
      let config = ModelConfig::default();
      let ctx = system_parameters().placeholder_context();
      let builder = RouteModelBuilder::new(&config, &ctx);

      let params = scope(&[(ROUTES, json!(["a.x.com", "b.x.com", "c.y.com"]))]);
      let chain = ParameterChain::new("web", vec![&global, &params]);
      assert_eq!(builder.domains(&chain).unwrap(), vec!["x.com", "y.com"]);

      let params = Parameters::new();
      let chain = ParameterChain::new("web", vec![&global, &params]);
      assert_eq!(builder.domains(&chain).unwrap(), vec!["cfapps.example.com"]);
    }
  }
}
