//! Platform offerings and orchestration errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ContentError;

const FORBIDDEN: u16 = 403;

/// A service offering available on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOffering {
  pub label: String,
  #[serde(default)]
  pub plans: Vec<ServicePlan>,
}

impl ServiceOffering {
  pub fn plan(&self, name: &str) -> Option<&ServicePlan> {
    self.plans.iter().find(|p| p.name == name)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServicePlan {
  pub name: String,
  pub guid: String,
}

/// A service created by the orchestrator and the offering it was created
/// from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedService {
  pub name: String,
  pub label: String,
}

/// A failed platform call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("platform call failed{}: {message}", .status.map(|s| format!(" with status {s}")).unwrap_or_default())]
pub struct PlatformError {
  /// HTTP status, when the platform answered.
  pub status: Option<u16>,
  pub message: String,
}

impl PlatformError {
  pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
    Self {
      status,
      message: message.into(),
    }
  }

  pub fn is_forbidden(&self) -> bool {
    self.status == Some(FORBIDDEN)
  }
}

impl From<reqwest::Error> for PlatformError {
  fn from(err: reqwest::Error) -> Self {
    PlatformError::new(err.status().map(|s| s.as_u16()), err.to_string())
  }
}

/// Errors raised while creating services.
#[derive(Debug, Error)]
pub enum OrchestratorError {
  #[error(transparent)]
  Content(#[from] ContentError),

  #[error(transparent)]
  Platform(#[from] PlatformError),
}
