//! Splitting route URIs into host, domain, port and path.
//!
//! Port-based routes look like `domain:port/path`, host-based routes like
//! `host.domain/path`. A scheme prefix (`https://`) is ignored.

const SCHEME_SEPARATOR: &str = "://";

/// The parts of a route URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriParts {
  pub host: String,
  pub domain: String,
  pub port: Option<u16>,
  pub path: Option<String>,
}

pub fn without_scheme(uri: &str) -> &str {
  match uri.find(SCHEME_SEPARATOR) {
    Some(index) if index > 0 => &uri[index + SCHEME_SEPARATOR.len()..],
    _ => uri,
  }
}

/// Prefix a URI with a scheme.
pub fn with_scheme(scheme: &str, uri: &str) -> String {
  format!("{scheme}{SCHEME_SEPARATOR}{uri}")
}

pub fn split(uri: &str) -> UriParts {
  let uri = without_scheme(uri);
  let (authority, path) = match uri.find('/') {
    Some(index) => (&uri[..index], Some(uri[index..].to_string())),
    None => (uri, None),
  };

  match authority.rfind(':') {
    Some(index) if index > 0 => UriParts {
      host: String::new(),
      domain: authority[..index].to_string(),
      port: authority[index + 1..].parse().ok().filter(|p| *p > 0),
      path,
    },
    _ => match authority.find('.') {
      Some(index) if index > 0 => UriParts {
        host: authority[..index].to_string(),
        domain: authority[index + 1..].to_string(),
        port: None,
        path,
      },
      _ => UriParts {
        host: String::new(),
        domain: authority.to_string(),
        port: None,
        path,
      },
    },
  }
}

pub fn domain(uri: &str) -> Option<String> {
  Some(split(uri).domain).filter(|d| !d.is_empty())
}

pub fn port(uri: &str) -> Option<u16> {
  split(uri).port
}
