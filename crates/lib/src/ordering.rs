//! Module deployment order from `deployed-after`.
//!
//! Modules form a DAG with an edge from every module to the modules deployed
//! after it. Sequential mode deploys one module per wave; parallel mode groups
//! independent modules into the same wave. Within a wave, and among modules
//! that are ready at the same time, declaration order is kept.

use std::collections::{BTreeSet, HashMap};

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::*;
use crate::descriptor::DeploymentDescriptor;
use crate::error::ContentError;
use crate::params::ParameterChainResolver;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
  #[default]
  Sequential,
  Parallel,
}

/// Modules grouped into waves that deploy one after the other.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentOrder {
  pub mode: DeploymentMode,
  pub waves: Vec<Vec<String>>,
}

impl DeploymentOrder {
  /// All modules in deployment order.
  pub fn modules(&self) -> Vec<&str> {
    self.waves.iter().flatten().map(String::as_str).collect()
  }
}

/// The `deployed-after` graph of a descriptor's modules.
pub struct ModuleGraph {
  graph: DiGraph<String, ()>,
}

impl ModuleGraph {
  pub fn from_descriptor(descriptor: &DeploymentDescriptor) -> Result<Self, ContentError> {
    let mut graph = DiGraph::new();
    let nodes: HashMap<&str, NodeIndex> = descriptor
      .modules
      .iter()
      .map(|m| (m.name.as_str(), graph.add_node(m.name.clone())))
      .collect();

    let resolver = ParameterChainResolver::new(descriptor);
    for module in &descriptor.modules {
      let chain = resolver.for_module(module);
      for dependency in chain.get_string_list(DEPLOYED_AFTER)? {
        let Some(&from) = nodes.get(dependency.as_str()) else {
          return Err(ContentError::UnknownDeployedAfter {
            module: module.name.clone(),
            dependency,
          });
        };
        graph.update_edge(from, nodes[module.name.as_str()], ());
      }
    }
    Ok(Self { graph })
  }

  /// Modules grouped by dependency depth, in declaration order per wave.
  pub fn waves(&self) -> Result<Vec<Vec<String>>, ContentError> {
    let mut in_degree: Vec<usize> = self
      .graph
      .node_indices()
      .map(|idx| self.graph.neighbors_directed(idx, Direction::Incoming).count())
      .collect();
    let mut remaining: BTreeSet<NodeIndex> = self.graph.node_indices().collect();
    let mut waves = Vec::new();

    while !remaining.is_empty() {
      let ready: Vec<NodeIndex> = remaining.iter().copied().filter(|idx| in_degree[idx.index()] == 0).collect();
      if ready.is_empty() {
        return Err(self.cycle_error(&remaining));
      }
      for idx in &ready {
        remaining.remove(idx);
        for next in self.graph.neighbors_directed(*idx, Direction::Outgoing) {
          in_degree[next.index()] = in_degree[next.index()].saturating_sub(1);
        }
      }
      waves.push(ready.into_iter().map(|idx| self.graph[idx].clone()).collect());
    }
    Ok(waves)
  }

  /// A topological order that always picks the earliest declared ready
  /// module.
  pub fn sequential(&self) -> Result<Vec<String>, ContentError> {
    let mut in_degree: Vec<usize> = self
      .graph
      .node_indices()
      .map(|idx| self.graph.neighbors_directed(idx, Direction::Incoming).count())
      .collect();
    let mut remaining: BTreeSet<NodeIndex> = self.graph.node_indices().collect();
    let mut order = Vec::new();

    loop {
      let Some(idx) = remaining.iter().copied().find(|idx| in_degree[idx.index()] == 0) else {
        break;
      };
      remaining.remove(&idx);
      for next in self.graph.neighbors_directed(idx, Direction::Outgoing) {
        in_degree[next.index()] = in_degree[next.index()].saturating_sub(1);
      }
      order.push(self.graph[idx].clone());
    }
    if !remaining.is_empty() {
      return Err(self.cycle_error(&remaining));
    }
    Ok(order)
  }

  fn cycle_error(&self, remaining: &BTreeSet<NodeIndex>) -> ContentError {
    ContentError::DeploymentOrderCycle {
      modules: remaining.iter().map(|idx| self.graph[*idx].clone()).collect(),
    }
  }
}

/// The deployment order of a descriptor's modules.
///
/// `enable-parallel-deployments` on the descriptor selects parallel waves.
pub fn deployment_order(descriptor: &DeploymentDescriptor) -> Result<DeploymentOrder, ContentError> {
  let parallel = match descriptor.parameters.get(ENABLE_PARALLEL_DEPLOYMENTS) {
    None => false,
    Some(value) => value
      .as_bool()
      .ok_or_else(|| ContentError::invalid_type(&descriptor.id, ENABLE_PARALLEL_DEPLOYMENTS, "boolean"))?,
  };
  let graph = ModuleGraph::from_descriptor(descriptor)?;

  let order = if parallel {
    DeploymentOrder {
      mode: DeploymentMode::Parallel,
      waves: graph.waves()?,
    }
  } else {
    DeploymentOrder {
      mode: DeploymentMode::Sequential,
      waves: graph.sequential()?.into_iter().map(|m| vec![m]).collect(),
    }
  };
  debug!(mode = ?order.mode, waves = order.waves.len(), "computed deployment order");
  Ok(order)
}
