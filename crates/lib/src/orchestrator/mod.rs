//! Creation of managed services with offering fallback.
//!
//! A managed service names a primary offering and optional alternatives.
//! Creation tries them in order: offerings missing on the platform are
//! dropped up front, offerings without the requested plan are skipped, and a
//! "forbidden" answer moves on to the next candidate. Any other failure stops
//! the attempt.

pub mod client;
mod types;

pub use types::*;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::consts::{SERVICE, SERVICE_PLAN};
use crate::descriptor::ResourceKind;
use crate::error::ContentError;
use crate::services::ServiceSpec;

/// The platform calls needed to create services.
#[async_trait]
pub trait PlatformClient: Send + Sync {
  /// All offerings visible to the caller, with their plans.
  async fn service_offerings(&self) -> Result<Vec<ServiceOffering>, PlatformError>;

  /// Create `service` from `plan` of the offering named `label`.
  async fn create_service(&self, service: &ServiceSpec, label: &str, plan: &ServicePlan) -> Result<(), PlatformError>;
}

/// Creates managed services, one platform call in flight at a time.
pub struct ServiceCreationOrchestrator<'a, C: PlatformClient + ?Sized> {
  client: &'a C,
}

impl<'a, C: PlatformClient + ?Sized> ServiceCreationOrchestrator<'a, C> {
  pub fn new(client: &'a C) -> Self {
    Self { client }
  }

  /// Create one managed service and return the offering label used.
  pub async fn create(&self, service: &ServiceSpec) -> Result<String, OrchestratorError> {
    let missing = |parameter: &str| ContentError::MissingParameter {
      resource: service.resource_name.clone(),
      kind: service.kind.to_string(),
      parameter: parameter.to_string(),
    };
    let candidates = service.candidate_labels();
    if candidates.is_empty() {
      return Err(missing(SERVICE).into());
    }
    let Some(plan) = service.plan.as_deref() else {
      return Err(missing(SERVICE_PLAN).into());
    };

    let offerings = self.client.service_offerings().await?;
    let existing: Vec<&ServiceOffering> = candidates
      .iter()
      .filter_map(|label| {
        let offering = offerings.iter().find(|o| &o.label == label);
        if offering.is_none() {
          warn!(service = %service.name, offering = %label, "service offering does not exist, skipping");
        }
        offering
      })
      .collect();

    let usable: Vec<(&ServiceOffering, &ServicePlan)> = existing
      .iter()
      .copied()
      .filter_map(|offering| {
        let found = offering.plan(plan);
        if found.is_none() {
          warn!(
            service = %service.name,
            offering = %offering.label,
            plan = %plan,
            "service offering does not provide service plan, skipping"
          );
        }
        found.map(|p| (offering, p))
      })
      .collect();
    if usable.is_empty() && !existing.is_empty() {
      return Err(
        ContentError::NoOfferingsMatchPlan {
          service: service.name.clone(),
          candidates: existing.iter().map(|o| o.label.clone()).collect(),
          plan: plan.to_string(),
        }
        .into(),
      );
    }

    for (offering, service_plan) in usable {
      let label = &offering.label;
      debug!(service = %service.name, offering = %label, plan = %plan, "creating service");
      match self.client.create_service(service, label, service_plan).await {
        Ok(()) => {
          info!(service = %service.name, offering = %label, "created service");
          return Ok(label.clone());
        }
        Err(err) if err.is_forbidden() => {
          warn!(service = %service.name, offering = %label, error = %err, "creation forbidden, trying next offering");
        }
        Err(err) => return Err(err.into()),
      }
    }

    Err(
      ContentError::CannotCreateService {
        service: service.name.clone(),
        offerings: candidates,
      }
      .into(),
    )
  }

  /// Create every managed service in order.
  ///
  /// Optional services that cannot be created are skipped with a warning.
  pub async fn create_all(&self, services: &[ServiceSpec]) -> Result<Vec<CreatedService>, OrchestratorError> {
    let mut created = Vec::new();
    for service in services {
      if service.kind != ResourceKind::ManagedService {
        debug!(service = %service.name, kind = %service.kind, "not a managed service, skipping");
        continue;
      }
      match self.create(service).await {
        Ok(label) => created.push(CreatedService {
          name: service.name.clone(),
          label,
        }),
        Err(err) if service.optional => {
          warn!(service = %service.name, error = %err, "skipping optional service");
        }
        Err(err) => return Err(err),
      }
    }
    Ok(created)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::services::SkipUpdates;
  use std::collections::HashMap;
  use std::sync::Mutex;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use tracing_test::traced_test;

  struct FakePlatform {
    offerings: Vec<ServiceOffering>,
    failures: HashMap<String, PlatformError>,
    attempts: Mutex<Vec<String>>,
    plan_guids: Mutex<Vec<String>>,
    listings: AtomicUsize,
  }

  impl FakePlatform {
    fn new(offerings: &[(&str, &[&str])]) -> Self {
      Self {
        offerings: offerings
          .iter()
          .map(|(label, plans)| ServiceOffering {
            label: label.to_string(),
            plans: plans
              .iter()
              .map(|p| ServicePlan {
                name: p.to_string(),
                guid: format!("{label}-{p}"),
              })
              .collect(),
          })
          .collect(),
        failures: HashMap::new(),
        attempts: Mutex::new(Vec::new()),
        plan_guids: Mutex::new(Vec::new()),
        listings: AtomicUsize::new(0),
      }
    }

    fn failing(mut self, label: &str, status: u16) -> Self {
      self
        .failures
        .insert(label.to_string(), PlatformError::new(Some(status), "nope"));
      self
    }

    fn attempts(&self) -> Vec<String> {
      self.attempts.lock().unwrap().clone()
    }

    fn listings(&self) -> usize {
      self.listings.load(Ordering::SeqCst)
    }
  }

  #[async_trait]
  impl PlatformClient for FakePlatform {
    async fn service_offerings(&self) -> Result<Vec<ServiceOffering>, PlatformError> {
      self.listings.fetch_add(1, Ordering::SeqCst);
      Ok(self.offerings.clone())
    }

    async fn create_service(&self, _service: &ServiceSpec, label: &str, plan: &ServicePlan) -> Result<(), PlatformError> {
      self.attempts.lock().unwrap().push(label.to_string());
      self.plan_guids.lock().unwrap().push(plan.guid.clone());
      match self.failures.get(label) {
        Some(err) => Err(err.clone()),
        None => Ok(()),
      }
    }
  }

  fn service(label: &str, alternatives: &[&str], plan: &str) -> ServiceSpec {
    ServiceSpec {
      name: "db".to_string(),
      resource_name: "db".to_string(),
      kind: ResourceKind::ManagedService,
      label: Some(label.to_string()),
      plan: Some(plan.to_string()),
      provider: None,
      broker: None,
      version: None,
      alternative_labels: alternatives.iter().map(|s| s.to_string()).collect(),
      credentials: Default::default(),
      tags: Vec::new(),
      syslog_drain_url: None,
      optional: false,
      managed: true,
      ignore_update_errors: false,
      skip_updates: SkipUpdates::default(),
    }
  }

  // ==========================================================================
  // Fallback
  // ==========================================================================

  #[tokio::test]
  #[traced_test]
  async fn missing_offering_falls_back_to_alternative() {
    let platform = FakePlatform::new(&[("postgresql-b", &["free"])]);
    let orchestrator = ServiceCreationOrchestrator::new(&platform);

    let label = orchestrator
      .create(&service("postgresql-a", &["postgresql-b"], "free"))
      .await
      .unwrap();

    assert_eq!(label, "postgresql-b");
    assert_eq!(platform.attempts(), vec!["postgresql-b"]);
    assert!(logs_contain("service offering does not exist"));
  }

  #[tokio::test]
  async fn forbidden_tries_next_candidate() {
    let platform = FakePlatform::new(&[("a", &["free"]), ("b", &["free"])]).failing("a", 403);
    let orchestrator = ServiceCreationOrchestrator::new(&platform);

    let label = orchestrator.create(&service("a", &["b"], "free")).await.unwrap();
    assert_eq!(label, "b");
    assert_eq!(platform.attempts(), vec!["a", "b"]);
  }

  #[tokio::test]
  async fn other_failures_stop_immediately() {
    let platform = FakePlatform::new(&[("a", &["free"]), ("b", &["free"])]).failing("a", 500);
    let orchestrator = ServiceCreationOrchestrator::new(&platform);

    let err = orchestrator.create(&service("a", &["b"], "free")).await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Platform(PlatformError { status: Some(500), .. })));
    assert_eq!(platform.attempts(), vec!["a"]);
  }

  #[tokio::test]
  async fn exhausted_candidates_name_all_offerings() {
    let platform = FakePlatform::new(&[("a", &["free"])]).failing("a", 403);
    let orchestrator = ServiceCreationOrchestrator::new(&platform);

    let err = orchestrator.create(&service("a", &["b"], "free")).await.unwrap_err();
    match err {
      OrchestratorError::Content(ContentError::CannotCreateService { service, offerings }) => {
        assert_eq!(service, "db");
        assert_eq!(offerings, vec!["a", "b"]);
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[tokio::test]
  async fn plan_mismatch_is_reported() {
    let platform = FakePlatform::new(&[("a", &["large"]), ("b", &["large"])]);
    let orchestrator = ServiceCreationOrchestrator::new(&platform);

    let err = orchestrator.create(&service("a", &["b"], "free")).await.unwrap_err();
    assert!(matches!(
      err,
      OrchestratorError::Content(ContentError::NoOfferingsMatchPlan { ref plan, .. }) if plan == "free"
    ));
    assert!(platform.attempts().is_empty());
  }

  #[tokio::test]
  #[traced_test]
  async fn candidates_without_plan_are_skipped() {
    let platform = FakePlatform::new(&[("a", &["large"]), ("b", &["free"])]);
    let orchestrator = ServiceCreationOrchestrator::new(&platform);

    let label = orchestrator.create(&service("a", &["b"], "free")).await.unwrap();
    assert_eq!(label, "b");
    assert_eq!(platform.attempts(), vec!["b"]);
    assert!(logs_contain("service offering does not provide service plan"));
  }

  #[tokio::test]
  async fn offerings_are_listed_once_per_service() {
    let platform = FakePlatform::new(&[("a", &["free"]), ("b", &["free"]), ("c", &["free"])])
      .failing("a", 403)
      .failing("b", 403);
    let orchestrator = ServiceCreationOrchestrator::new(&platform);

    let label = orchestrator.create(&service("a", &["b", "c"], "free")).await.unwrap();
    assert_eq!(label, "c");
    assert_eq!(platform.attempts(), vec!["a", "b", "c"]);
    assert_eq!(platform.listings(), 1);
    assert_eq!(
      *platform.plan_guids.lock().unwrap(),
      vec!["a-free", "b-free", "c-free"]
    );
  }

  #[tokio::test]
  async fn missing_plan_fails_before_listing() {
    let platform = FakePlatform::new(&[("a", &["free"])]);
    let orchestrator = ServiceCreationOrchestrator::new(&platform);

    let mut spec = service("a", &[], "free");
    spec.plan = None;
    let err = orchestrator.create(&spec).await.unwrap_err();
    assert!(matches!(
      err,
      OrchestratorError::Content(ContentError::MissingParameter { ref parameter, .. }) if parameter == "service-plan"
    ));
    assert_eq!(platform.listings(), 0);
  }

  // ==========================================================================
  // Batches
  // ==========================================================================

  #[tokio::test]
  async fn create_all_skips_optional_failures_and_non_managed() {
    let platform = FakePlatform::new(&[("a", &["free"])]);
    let orchestrator = ServiceCreationOrchestrator::new(&platform);

    let mut optional = service("missing", &[], "free");
    optional.name = "cache".to_string();
    optional.optional = true;
    let mut existing = service("a", &[], "free");
    existing.kind = ResourceKind::ExistingService;

    let created = orchestrator
      .create_all(&[service("a", &[], "free"), optional, existing])
      .await
      .unwrap();
    assert_eq!(
      created,
      vec![CreatedService {
        name: "db".to_string(),
        label: "a".to_string()
      }]
    );
  }
}
