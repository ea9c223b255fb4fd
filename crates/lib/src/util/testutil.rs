//! Test fixtures for cloudmodel-lib.
//!
//! Builders for descriptors and deployment targets shared by the unit tests of
//! the model builders.

use chrono::{TimeZone, Utc};

use crate::config::SystemParameters;
use crate::descriptor::DeploymentDescriptor;

/// Parse a descriptor, panicking on invalid YAML.
pub fn descriptor(yaml: &str) -> DeploymentDescriptor {
  DeploymentDescriptor::from_yaml_str(yaml).expect("test descriptor must parse")
}

/// A deployment target with fixed values and a fixed timestamp.
pub fn system_parameters() -> SystemParameters {
  SystemParameters {
    user: Some("deployer".to_string()),
    authorization_endpoint: Some("https://login.example.com".to_string()),
    deploy_service_url: Some("deploy-service.cfapps.example.com".to_string()),
    org_guid: Some("org-guid".to_string()),
    space_guid: Some("space-guid".to_string()),
    timestamp: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
    ..SystemParameters::new("acme", "dev", "cfapps.example.com", "https://api.example.com")
  }
}

/// A descriptor with system parameters already injected.
pub fn injected_descriptor(yaml: &str) -> DeploymentDescriptor {
  let mut d = descriptor(yaml);
  system_parameters().inject_into(&mut d);
  d
}

/// The shop descriptor used across model tests: a web module bound to a
/// managed database, a user-provided credentials service and an existing
/// shared service, plus a backend module providing a public API.
pub const SHOP: &str = r#"
ID: com.example.shop
version: 1.2.0
description: Example shop
provider: Example Inc.
modules:
  - name: web
    type: javascript
    description: Storefront
    parameters:
      memory: 256M
      instances: 2
      check-deploy-id: true
    properties:
      GREETING: hello
    requires:
      - name: db
      - name: creds
      - name: shared
      - name: backend-api
        group: destinations
        properties:
          url: https://backend.example.com
    provides:
      - name: web-ui
        public: true
        properties:
          url: https://web.example.com
      - name: web-internal
  - name: backend
    type: java
    parameters:
      memory: 1G
    requires:
      - name: db
    provides:
      - name: backend-api
        public: true
        properties:
          url: https://backend.example.com
resources:
  - name: db
    type: org.cloudfoundry.managed-service
    parameters:
      service: postgresql
      service-plan: free
  - name: creds
    type: org.cloudfoundry.user-provided-service
    parameters:
      config:
        user: admin
  - name: shared
    type: org.cloudfoundry.existing-service
"#;
