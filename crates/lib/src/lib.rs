//! cloudmodel-lib: Cloud model building for multi-target applications
//!
//! This crate compiles a deployment descriptor into the concrete model a
//! deployer needs:
//! - `ApplicationSpec`: name, memory, routes, environment and bindings per module
//! - `ServiceSpec`: managed, user-provided and existing service instances
//! - `ConfigurationEntry`: published provided dependencies
//! - `Manifest`: Kubernetes objects for cluster targets
//!
//! [`model::CloudModelBuilder`] is the usual entry point.

pub mod apps;
pub mod config;
pub mod config_entries;
pub mod consts;
pub mod deployed;
pub mod descriptor;
pub mod env;
pub mod error;
pub mod k8s;
pub mod model;
pub mod naming;
pub mod orchestrator;
pub mod ordering;
pub mod params;
pub mod placeholder;
pub mod routes;
pub mod services;
pub mod util;
