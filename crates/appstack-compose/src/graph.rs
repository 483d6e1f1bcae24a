//! Dependency graph management using `petgraph`.
//!
//! Builds a directed acyclic graph over resource titles and resolves the
//! order in which the resources must be converged.

use std::collections::HashMap;

use appstack_common::error::{AppStackError, Result};
use petgraph::graph::NodeIndex;

use crate::resources::{Resource, file_title};

/// A dependency graph of resources.
#[derive(Debug)]
pub struct DependencyGraph {
    /// Internal petgraph representation.
    graph: petgraph::Graph<String, ()>,
    /// Title to node lookup.
    nodes: HashMap<String, NodeIndex>,
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

    /// Adds a resource node, or returns the existing node with that title.
    pub fn add_resource(&mut self, title: impl Into<String>) -> NodeIndex {
        let title = title.into();
        if let Some(&idx) = self.nodes.get(&title) {
            return idx;
        }
        let idx = self.graph.add_node(title.clone());
        let _ = self.nodes.insert(title, idx);
        idx
    }

    /// Adds a dependency edge: `dependent` depends on `dependency`.
    ///
    /// The graph edge points from `dependency` to `dependent`
    /// so that topological sort yields dependencies first.
    pub fn add_dependency(&mut self, dependent: NodeIndex, dependency: NodeIndex) {
        let _ = self.graph.update_edge(dependency, dependent, ());
    }

    /// Returns the number of resources in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// Returns true if the graph holds no resources.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Returns a topological ordering of resource titles.
    ///
    /// Dependencies appear before the resources that depend on them.
    ///
    /// # Errors
    ///
    /// Returns an error if the graph contains cycles.
    pub fn resolve_order(&self) -> Result<Vec<String>> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(indices) => Ok(indices
                .iter()
                .filter_map(|&idx| self.graph.node_weight(idx).cloned())
                .collect()),
            Err(cycle) => Err(AppStackError::Config {
                message: format!(
                    "cyclic dependency detected at {}",
                    self.graph
                        .node_weight(cycle.node_id())
                        .map_or("<unknown>", String::as_str)
                ),
            }),
        }
    }

    /// Builds the graph for a set of planned resources.
    ///
    /// Managed files depend on their parent directory when that directory is
    /// managed, the compose file also depends on the docker group, and the
    /// compose action depends on the engine, the compose tool, and everything
    /// it requires.
    #[must_use]
    pub fn from_resources(resources: &[Resource]) -> Self {
        let mut graph = Self::new();
        for resource in resources {
            let _ = graph.add_resource(resource.title());
        }

        for resource in resources {
            let node = graph.add_resource(resource.title());
            match resource {
                Resource::Directory { path, .. } | Resource::File { path, .. } => {
                    if let Some(parent) = path.parent() {
                        let parent_title = file_title(parent);
                        if let Some(&dir) = graph.nodes.get(&parent_title) {
                            graph.add_dependency(node, dir);
                        }
                    }
                    if let Resource::File { group, .. } = resource {
                        if let Some(&grp) = graph.nodes.get(&format!("Group[{group}]")) {
                            graph.add_dependency(node, grp);
                        }
                    }
                }
                Resource::ContainerEngine { .. } => {
                    if let Some(&grp) = graph.nodes.get("Group[docker]") {
                        graph.add_dependency(node, grp);
                    }
                }
                Resource::Compose { requires, .. } => {
                    for title in requires {
                        let dep = graph.add_resource(title.as_str());
                        graph.add_dependency(node, dep);
                    }
                    for other in resources {
                        if matches!(
                            other,
                            Resource::ContainerEngine { .. } | Resource::ComposeTool { .. }
                        ) {
                            let dep = graph.add_resource(other.title());
                            graph.add_dependency(node, dep);
                        }
                    }
                }
                Resource::Group { .. } | Resource::ComposeTool { .. } | Resource::Prerequisite { .. } => {}
            }
        }
        graph
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_graph_resolves_to_empty() {
        let graph = DependencyGraph::new();
        let order = graph.resolve_order().expect("should resolve");
        assert!(order.is_empty());
        assert!(graph.is_empty());
    }

    #[test]
    fn adding_same_title_twice_reuses_node() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_resource("File[/a]");
        let b = graph.add_resource("File[/a]");
        assert_eq!(a, b);
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn linear_dependency_chain() {
        let mut graph = DependencyGraph::new();
        let compose = graph.add_resource("Compose[stack]");
        let file = graph.add_resource("File[/opt/stack/docker-compose.yaml]");
        graph.add_dependency(compose, file);

        let order = graph.resolve_order().expect("should resolve");
        assert_eq!(order, ["File[/opt/stack/docker-compose.yaml]", "Compose[stack]"]);
    }

    #[test]
    fn cycle_detection() {
        let mut graph = DependencyGraph::new();
        let a = graph.add_resource("a");
        let b = graph.add_resource("b");
        graph.add_dependency(a, b);
        graph.add_dependency(b, a);

        let msg = graph.resolve_order().unwrap_err().to_string();
        assert!(msg.contains("cyclic"), "got: {msg}");
    }

    #[test]
    fn resources_order_directories_before_files_before_compose() {
        let resources = vec![
            Resource::Compose {
                project: "stack".into(),
                compose_files: vec!["/opt/stack/docker-compose.yaml".into()],
                requires: vec![
                    "File[/tmp/cert.pem]".into(),
                    "File[/opt/stack/docker-compose.yaml]".into(),
                ],
                subscribes: Vec::new(),
            },
            Resource::File {
                path: "/opt/stack/docker-compose.yaml".into(),
                owner: "root".into(),
                group: "docker".into(),
                mode: "0440".into(),
                content: String::new(),
                digest: appstack_common::types::Sha256Hash::from_hex("a".repeat(64))
                    .expect("digest"),
            },
            Resource::Prerequisite {
                path: "/tmp/cert.pem".into(),
            },
            Resource::Directory {
                path: "/opt/stack".into(),
                owner: "11223".into(),
                group: "11223".into(),
                mode: "0755".into(),
            },
            Resource::Group {
                name: "docker".into(),
                ensure: appstack_common::types::Ensure::Present,
            },
        ];
        let order = DependencyGraph::from_resources(&resources)
            .resolve_order()
            .expect("should resolve");
        let pos = |title: &str| order.iter().position(|t| t == title).expect(title);
        assert!(pos("File[/opt/stack]") < pos("File[/opt/stack/docker-compose.yaml]"));
        assert!(pos("Group[docker]") < pos("File[/opt/stack/docker-compose.yaml]"));
        assert!(pos("File[/tmp/cert.pem]") < pos("Compose[stack]"));
        assert!(pos("File[/opt/stack/docker-compose.yaml]") < pos("Compose[stack]"));
    }
}
