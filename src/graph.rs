//! Project dependency graph and change propagation.
//!
//! Edges are declared project-to-project references: A → B means A depends
//! on B, so a change in B propagates to A. Traversal is an explicit
//! stack-and-visited-set loop, never recursion, so deep or cyclic graphs
//! cannot overflow the call stack and always terminate.

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet};

/// Directed graph of project references.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a project node exists.
    pub fn add_project(&mut self, name: impl Into<String>) -> NodeIndex {
        let name = name.into();
        match self.nodes.get(&name) {
            Some(&idx) => idx,
            None => {
                let idx = self.graph.add_node(name.clone());
                self.nodes.insert(name, idx);
                idx
            }
        }
    }

    /// Declare that `project` depends on `dependency`.
    pub fn add_dependency(&mut self, project: &str, dependency: &str) {
        let from = self.add_project(project);
        let to = self.add_project(dependency);
        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, ());
        }
    }

    /// All projects `project` transitively depends on, sorted, excluding
    /// itself. Unknown projects have no dependencies.
    pub fn dependencies_of(&self, project: &str) -> Vec<String> {
        let Some(&start) = self.nodes.get(project) else {
            return Vec::new();
        };

        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut stack = vec![start];
        visited.insert(start);

        while let Some(node) = stack.pop() {
            for neighbor in self.graph.neighbors(node) {
                if visited.insert(neighbor) {
                    stack.push(neighbor);
                }
            }
        }

        visited.remove(&start);
        let mut names: Vec<String> = visited
            .into_iter()
            .map(|idx| self.graph[idx].clone())
            .collect();
        names.sort();
        names
    }

    /// Whether `project` participates in a reference cycle.
    pub fn is_in_cycle(&self, project: &str) -> bool {
        let Some(&start) = self.nodes.get(project) else {
            return false;
        };
        // A node is on a cycle exactly when it can reach itself again.
        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut stack: Vec<NodeIndex> = self.graph.neighbors(start).collect();
        while let Some(node) = stack.pop() {
            if node == start {
                return true;
            }
            if visited.insert(node) {
                stack.extend(self.graph.neighbors(node));
            }
        }
        false
    }

    /// Whether any cycle exists anywhere in the graph.
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Known project names, sorted.
    pub fn projects(&self) -> Vec<String> {
        let mut names: Vec<String> = self.nodes.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_dependency() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("app", "core");
        assert_eq!(graph.dependencies_of("app"), vec!["core"]);
        assert!(graph.dependencies_of("core").is_empty());
    }

    #[test]
    fn test_transitive_closure() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("app", "api");
        graph.add_dependency("api", "core");
        graph.add_dependency("core", "util");
        assert_eq!(graph.dependencies_of("app"), vec!["api", "core", "util"]);
    }

    #[test]
    fn test_diamond() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("app", "left");
        graph.add_dependency("app", "right");
        graph.add_dependency("left", "base");
        graph.add_dependency("right", "base");
        assert_eq!(graph.dependencies_of("app"), vec!["base", "left", "right"]);
    }

    #[test]
    fn test_cycle_terminates() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "b");
        graph.add_dependency("b", "c");
        graph.add_dependency("c", "a");

        assert_eq!(graph.dependencies_of("a"), vec!["b", "c"]);
        assert!(graph.has_cycles());
        assert!(graph.is_in_cycle("a"));
        assert!(graph.is_in_cycle("b"));
    }

    #[test]
    fn test_self_loop() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("a", "a");
        assert!(graph.dependencies_of("a").is_empty());
        assert!(graph.is_in_cycle("a"));
    }

    #[test]
    fn test_no_cycle_flags() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("app", "core");
        assert!(!graph.has_cycles());
        assert!(!graph.is_in_cycle("app"));
    }

    #[test]
    fn test_unknown_project() {
        let graph = DependencyGraph::new();
        assert!(graph.dependencies_of("ghost").is_empty());
        assert!(!graph.is_in_cycle("ghost"));
    }

    #[test]
    fn test_duplicate_edges_ignored() {
        let mut graph = DependencyGraph::new();
        graph.add_dependency("app", "core");
        graph.add_dependency("app", "core");
        assert_eq!(graph.dependencies_of("app"), vec!["core"]);
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let mut graph = DependencyGraph::new();
        for i in 0..10_000 {
            graph.add_dependency(&format!("p{}", i), &format!("p{}", i + 1));
        }
        assert_eq!(graph.dependencies_of("p0").len(), 10_000);
    }
}
