//! Whole-catalog dependency checks
//!
//! Both checks run after every module has been loaded and are pure
//! functions of the module list. Existence runs first so the cycle check
//! only ever sees edges between known modules.

use crate::error::GraphError;
use crate::module::Module;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Anything with a name and named dependencies
pub trait DependencyNode {
    fn name(&self) -> &str;
    fn dependencies(&self) -> &[String];
}

impl DependencyNode for Module {
    fn name(&self) -> &str {
        Module::name(self)
    }

    fn dependencies(&self) -> &[String] {
        Module::dependencies(self)
    }
}

/// Fail on the first dependency that names no module in `nodes`
pub fn check_dependencies_exist<N: DependencyNode>(nodes: &[N]) -> Result<(), GraphError> {
    let names: HashSet<&str> = nodes.iter().map(|n| n.name()).collect();

    for node in nodes {
        for dependency in node.dependencies() {
            if !names.contains(dependency.as_str()) {
                return Err(GraphError::MissingDependency {
                    module: node.name().to_string(),
                    dependency: dependency.clone(),
                });
            }
        }
    }

    Ok(())
}

/// Fail if the dependency relation has no topological order
///
/// Edges point from a dependency to its dependent.
pub fn check_for_circular_dependencies<N: DependencyNode>(nodes: &[N]) -> Result<(), GraphError> {
    let mut graph: DiGraph<&str, ()> = DiGraph::with_capacity(nodes.len(), nodes.len());
    let mut indices: HashMap<&str, NodeIndex> = HashMap::with_capacity(nodes.len());

    for node in nodes {
        let name = node.name();
        if indices.contains_key(name) {
            return Err(GraphError::DuplicateModule {
                module: name.to_string(),
            });
        }
        indices.insert(name, graph.add_node(name));
    }

    for node in nodes {
        let dependent = indices[node.name()];
        for dependency in node.dependencies() {
            let Some(&source) = indices.get(dependency.as_str()) else {
                return Err(GraphError::Construction {
                    module: node.name().to_string(),
                    dependency: dependency.clone(),
                });
            };
            graph.add_edge(source, dependent, ());
        }
    }

    toposort(&graph, None).map_err(|cycle| GraphError::CycleDetected {
        module: graph[cycle.node_id()].to_string(),
    })?;

    debug!(nodes = graph.node_count(), edges = graph.edge_count(), "Dependency graph is acyclic");
    Ok(())
}

/// Existence check, then cycle check
pub fn validate<N: DependencyNode>(nodes: &[N]) -> Result<(), GraphError> {
    check_dependencies_exist(nodes)?;
    check_for_circular_dependencies(nodes)
}
