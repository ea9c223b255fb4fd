//! Configuration entry types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::consts::{ANY_TARGET, TARGET_DELIMITER};
use crate::error::ContentError;

/// An org/space pair. `*` matches any org or space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CloudTarget {
  pub org: String,
  pub space: String,
}

impl CloudTarget {
  pub fn new(org: impl Into<String>, space: impl Into<String>) -> Self {
    Self {
      org: org.into(),
      space: space.into(),
    }
  }

  /// Any space of `org`.
  pub fn any_space(org: impl Into<String>) -> Self {
    Self::new(org, ANY_TARGET)
  }
}

impl fmt::Display for CloudTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}{TARGET_DELIMITER}{}", self.org, self.space)
  }
}

/// A parsed package version: `major[.minor[.patch]][-qualifier]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
  pub major: u64,
  pub minor: u64,
  pub patch: u64,
  pub qualifier: Option<String>,
}

impl Version {
  /// Parse the version of multi-target application `mta`.
  pub fn parse(mta: &str, input: &str) -> Result<Self, ContentError> {
    let invalid = || ContentError::InvalidVersion {
      mta: mta.to_string(),
      version: input.to_string(),
    };
    let trimmed = input.trim();
    let (numbers, qualifier) = match trimmed.split_once(['-', '+']) {
      Some((numbers, qualifier)) if !qualifier.is_empty() => (numbers, Some(qualifier.to_string())),
      Some(_) => return Err(invalid()),
      None => (trimmed, None),
    };

    let parts: Vec<&str> = numbers.split('.').collect();
    if parts.is_empty() || parts.len() > 3 {
      return Err(invalid());
    }
    let mut values = [0u64; 3];
    for (slot, part) in values.iter_mut().zip(&parts) {
      *slot = part.parse().map_err(|_| invalid())?;
    }
    Ok(Version {
      major: values[0],
      minor: values[1],
      patch: values[2],
      qualifier,
    })
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
    if let Some(qualifier) = &self.qualifier {
      write!(f, "-{qualifier}")?;
    }
    Ok(())
  }
}

impl Serialize for Version {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

/// A published provided dependency other packages can consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigurationEntry {
  pub provider_nid: String,
  /// `<mta-id>:<dependency>`
  pub provider_id: String,
  pub provider_namespace: String,
  pub version: Version,
  pub target: CloudTarget,
  /// The dependency's properties as JSON.
  pub content: String,
  pub visibility: Vec<CloudTarget>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub space_guid: Option<String>,
}
