//! Dependency graph management using `petgraph`.
//!
//! Builds a directed acyclic graph from the `requires` declarations of
//! an application manifest and resolves the order resources start in.

use std::collections::HashMap;

use stagehand_common::error::{Result, StagehandError};
use stagehand_common::types::ResourceName;

/// A dependency graph of resources.
#[derive(Debug)]
pub struct DependencyGraph {
    /// Internal petgraph representation.
    graph: petgraph::Graph<ResourceName, ()>,
    /// Node lookup by resource name.
    nodes: HashMap<ResourceName, petgraph::graph::NodeIndex>,
}

impl DependencyGraph {
    /// Creates an empty dependency graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: petgraph::Graph::new(),
            nodes: HashMap::new(),
        }
    }

    /// Adds a resource node, returning the existing node if already present.
    pub fn add_resource(&mut self, name: ResourceName) -> petgraph::graph::NodeIndex {
        if let Some(&idx) = self.nodes.get(&name) {
            return idx;
        }
        let idx = self.graph.add_node(name.clone());
        let _ = self.nodes.insert(name, idx);
        idx
    }

    /// Adds a dependency edge: `dependent` requires `dependency`.
    ///
    /// The graph edge points from `dependency` to `dependent`
    /// so that topological sort yields dependencies first.
    pub fn add_dependency(
        &mut self,
        dependent: petgraph::graph::NodeIndex,
        dependency: petgraph::graph::NodeIndex,
    ) {
        let _ = self.graph.add_edge(dependency, dependent, ());
    }

    /// Returns the number of resources in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns whether the graph has no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns a start ordering: every resource appears after the
    /// resources it requires.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn resolve_order(&self) -> Result<Vec<ResourceName>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => Err(StagehandError::Descriptor {
                message: format!(
                    "cyclic dependency detected involving {}",
                    self.graph[cycle.node_id()]
                ),
            }),
        }
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
