//! Route and port types.

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Which family of routing parameters to read.
///
/// Idle routes are computed from their own parameters (`idle-host`,
/// `idle-domain`, ...) so the not-yet-live version of an application can be
/// reached before the swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingParameterSet {
  Default,
  Idle,
}

/// Parameter names of one routing parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteParameterNames {
  pub host: &'static str,
  pub hosts: &'static str,
  pub domain: &'static str,
  pub domains: &'static str,
  pub port: &'static str,
  pub ports: &'static str,
  pub route: &'static str,
  pub routes: &'static str,
  pub default_host: &'static str,
  pub default_domain: &'static str,
  pub default_port: &'static str,
}

impl RoutingParameterSet {
  pub fn names(&self) -> RouteParameterNames {
    match self {
      RoutingParameterSet::Default => RouteParameterNames {
        host: HOST,
        hosts: HOSTS,
        domain: DOMAIN,
        domains: DOMAINS,
        port: PORT,
        ports: PORTS,
        route: ROUTE,
        routes: ROUTES,
        default_host: DEFAULT_HOST,
        default_domain: DEFAULT_DOMAIN,
        default_port: DEFAULT_PORT,
      },
      RoutingParameterSet::Idle => RouteParameterNames {
        host: IDLE_HOST,
        hosts: IDLE_HOSTS,
        domain: IDLE_DOMAIN,
        domains: IDLE_DOMAINS,
        port: IDLE_PORT,
        ports: IDLE_PORTS,
        route: IDLE_ROUTE,
        routes: IDLE_ROUTES,
        default_host: DEFAULT_IDLE_HOST,
        default_domain: DEFAULT_IDLE_DOMAIN,
        default_port: DEFAULT_IDLE_PORT,
      },
    }
  }
}

/// Transport of an application port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortType {
  #[default]
  Http,
  Tcp,
  Tcps,
}

impl PortType {
  pub fn as_str(&self) -> &'static str {
    match self {
      PortType::Http => "http",
      PortType::Tcp => TCP,
      PortType::Tcps => TCPS,
    }
  }
}

/// A port the application listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApplicationPort {
  pub port: u16,
  pub port_type: PortType,
}
