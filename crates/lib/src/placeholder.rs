//! Platform placeholder parsing and substitution.
//!
//! Descriptors can reference values that are only known for a concrete
//! deployment target: the default domain, the controller endpoint, the
//! deploy service URL, and so on. These are written as named tokens and
//! replaced here once the deployment context is known.
//!
//! # Placeholder Formats
//!
//! - `{xsa-placeholder-domain-default}` - default shared domain
//! - `{xsa-placeholder-domain-idle-default}` - default domain for idle routes
//! - `{xsa-placeholder-protocol}` - protocol used for application routes
//! - `{xsa-placeholder-endpoint-authorization}` - authorization endpoint
//! - `{xsa-placeholder-service-url-deploy-service}` - deploy service URL
//! - `{xsa-placeholder-endpoint-controller}` - platform controller endpoint
//! - `{xsa-placeholder-router-port}` - router port
//!
//! # Unknown Tokens
//!
//! Anything else in braces, including unknown `xsa-placeholder-*` names and
//! tokens the context cannot resolve, passes through unchanged. Substitution
//! never fails, and substituting an already substituted string is a no-op.
//!
//! # Example
//!
//! ```
//! use cloudmodel_lib::placeholder::{PlaceholderContext, substitute};
//!
//! let ctx = PlaceholderContext {
//!   default_domain: Some("cfapps.example.com".to_string()),
//!   ..Default::default()
//! };
//! assert_eq!(
//!   substitute("app.{xsa-placeholder-domain-default}/{path}", &ctx),
//!   "app.cfapps.example.com/{path}"
//! );
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

const TOKEN_PREFIX: &str = "xsa-placeholder-";

/// A named platform placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
  DefaultDomain,
  DefaultIdleDomain,
  Protocol,
  AuthorizationEndpoint,
  DeployServiceUrl,
  ControllerEndpoint,
  RouterPort,
}

impl Placeholder {
  pub const ALL: [Placeholder; 7] = [
    Placeholder::DefaultDomain,
    Placeholder::DefaultIdleDomain,
    Placeholder::Protocol,
    Placeholder::AuthorizationEndpoint,
    Placeholder::DeployServiceUrl,
    Placeholder::ControllerEndpoint,
    Placeholder::RouterPort,
  ];

  /// Name of the placeholder after the `xsa-placeholder-` prefix.
  fn name(&self) -> &'static str {
    match self {
      Placeholder::DefaultDomain => "domain-default",
      Placeholder::DefaultIdleDomain => "domain-idle-default",
      Placeholder::Protocol => "protocol",
      Placeholder::AuthorizationEndpoint => "endpoint-authorization",
      Placeholder::DeployServiceUrl => "service-url-deploy-service",
      Placeholder::ControllerEndpoint => "endpoint-controller",
      Placeholder::RouterPort => "router-port",
    }
  }

  /// The full token, braces included.
  pub fn token(&self) -> String {
    format!("{{{TOKEN_PREFIX}{}}}", self.name())
  }

  fn from_content(content: &str) -> Option<Self> {
    let name = content.strip_prefix(TOKEN_PREFIX)?;
    Self::ALL.into_iter().find(|p| p.name() == name)
  }
}

/// A segment of parsed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
  /// Literal text (no placeholders)
  Literal(String),

  /// A placeholder to be resolved
  Placeholder(Placeholder),
}

/// Trait for looking up placeholder values.
pub trait Resolver {
  /// The value for a placeholder, or `None` to leave the token in place.
  fn resolve(&self, placeholder: Placeholder) -> Option<&str>;
}

/// Placeholder values of one deployment target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceholderContext {
  pub default_domain: Option<String>,
  pub default_idle_domain: Option<String>,
  pub protocol: Option<String>,
  pub authorization_endpoint: Option<String>,
  pub deploy_service_url: Option<String>,
  pub controller_endpoint: Option<String>,
  pub router_port: Option<String>,
}

impl Resolver for PlaceholderContext {
  fn resolve(&self, placeholder: Placeholder) -> Option<&str> {
    let value = match placeholder {
      Placeholder::DefaultDomain => &self.default_domain,
      // Idle routes share the default domain unless a dedicated one is configured
      Placeholder::DefaultIdleDomain => match &self.default_idle_domain {
        Some(_) => &self.default_idle_domain,
        None => &self.default_domain,
      },
      Placeholder::Protocol => &self.protocol,
      Placeholder::AuthorizationEndpoint => &self.authorization_endpoint,
      Placeholder::DeployServiceUrl => &self.deploy_service_url,
      Placeholder::ControllerEndpoint => &self.controller_endpoint,
      Placeholder::RouterPort => &self.router_port,
    };
    value.as_deref()
  }
}

/// Parse a string into literal text and known placeholders.
///
/// Unknown brace expressions and unclosed braces stay literal.
pub fn parse(input: &str) -> Vec<Segment> {
  let mut segments = Vec::new();
  let mut literal = String::new();
  let mut rest = input;

  while let Some(open) = rest.find('{') {
    literal.push_str(&rest[..open]);
    let after_open = &rest[open + 1..];

    match after_open.find(['{', '}']) {
      Some(close) if after_open.as_bytes()[close] == b'}' => {
        let content = &after_open[..close];
        match Placeholder::from_content(content) {
          Some(placeholder) => {
            // Flush accumulated literal
            if !literal.is_empty() {
              segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Placeholder(placeholder));
          }
          None => {
            literal.push('{');
            literal.push_str(content);
            literal.push('}');
          }
        }
        rest = &after_open[close + 1..];
      }
      _ => {
        // Nested or unclosed brace: keep the '{' and continue after it
        literal.push('{');
        rest = after_open;
      }
    }
  }
  literal.push_str(rest);

  if !literal.is_empty() {
    segments.push(Segment::Literal(literal));
  }

  segments
}

/// Substitute all resolvable placeholders in a string.
pub fn substitute(input: &str, resolver: &impl Resolver) -> String {
  if !input.contains('{') {
    return input.to_string();
  }
  substitute_segments(&parse(input), resolver)
}

/// Substitute placeholders in pre-parsed segments.
pub fn substitute_segments(segments: &[Segment], resolver: &impl Resolver) -> String {
  let mut result = String::new();

  for segment in segments {
    match segment {
      Segment::Literal(s) => result.push_str(s),
      Segment::Placeholder(p) => match resolver.resolve(*p) {
        Some(value) => result.push_str(value),
        None => result.push_str(&p.token()),
      },
    }
  }

  result
}

/// Substitute placeholders in every string of a list, keeping order.
pub fn substitute_all(inputs: &[String], resolver: &impl Resolver) -> Vec<String> {
  inputs.iter().map(|s| substitute(s, resolver)).collect()
}

/// Substitute placeholders in every string nested in a JSON value.
///
/// Map keys are left untouched.
pub fn substitute_value(value: &Value, resolver: &impl Resolver) -> Value {
  match value {
    Value::String(s) => Value::String(substitute(s, resolver)),
    Value::Array(items) => Value::Array(items.iter().map(|v| substitute_value(v, resolver)).collect()),
    Value::Object(map) => Value::Object(
      map
        .iter()
        .map(|(k, v)| (k.clone(), substitute_value(v, resolver)))
        .collect(),
    ),
    other => other.clone(),
  }
}
