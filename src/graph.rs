// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! The requires graph with petgraph backing for algorithms
//!
//! Vertices are stack names. An edge `dependency -> dependent` is added for
//! every requirement, so edges point in deployment direction.

use crate::error::{Result, StackError};
use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// Directed graph of stack names which refuses edges closing a cycle
#[derive(Debug, Clone, Default)]
pub struct RequiresGraph {
    /// The underlying directed graph
    graph: DiGraph<String, ()>,
    /// Map from stack name to node index
    node_indices: HashMap<String, NodeIndex>,
}

impl RequiresGraph {
    /// Create a new empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex. Adding an existing vertex is a no-op.
    pub fn add_vertex(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.node_indices.insert(name.to_string(), idx);
        idx
    }

    /// Add the edge `from -> to` unless it would create a cycle.
    ///
    /// Both vertices must exist. Adding an existing edge is a no-op.
    pub fn add_edge(&mut self, from: &str, to: &str) -> Result<()> {
        let from_idx = self.index(from, to, from)?;
        let to_idx = self.index(from, to, to)?;

        if self.graph.contains_edge(from_idx, to_idx) {
            return Ok(());
        }

        // an existing path to -> from closes the loop
        if from_idx == to_idx || has_path_connecting(&self.graph, to_idx, from_idx, None) {
            return Err(StackError::CycleDetected {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        self.graph.add_edge(from_idx, to_idx, ());
        Ok(())
    }

    fn index(&self, from: &str, to: &str, name: &str) -> Result<NodeIndex> {
        self.node_indices
            .get(name)
            .copied()
            .ok_or_else(|| StackError::GraphConstruction {
                element: format!("edge {from:?} -> {to:?}"),
                reason: format!("vertex {name:?} not found"),
            })
    }

    /// Whether a vertex exists
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.node_indices.contains_key(name)
    }

    /// Get node count
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get edge count
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check if the graph is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// All vertex names, sorted
    #[must_use]
    pub fn vertices(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.graph.node_weights().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// All edges as `(dependency, dependent)`, sorted
    #[must_use]
    pub fn edges(&self) -> Vec<(&str, &str)> {
        let mut edges: Vec<(&str, &str)> = self
            .graph
            .raw_edges()
            .iter()
            .map(|e| {
                (
                    self.graph[e.source()].as_str(),
                    self.graph[e.target()].as_str(),
                )
            })
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Stacks `name` requires directly, sorted
    #[must_use]
    pub fn dependencies(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Incoming)
    }

    /// Stacks requiring `name` directly, sorted
    #[must_use]
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        self.neighbors(name, Direction::Outgoing)
    }

    fn neighbors(&self, name: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(name) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Vertices in an order where every dependency precedes its dependents
    pub fn topological_order(&self) -> Result<Vec<&str>> {
        toposort(&self.graph, None)
            .map(|indices| indices.into_iter().map(|idx| self.graph[idx].as_str()).collect())
            .map_err(|cycle| StackError::GraphConstruction {
                element: format!("vertex {:?}", self.graph[cycle.node_id()]),
                reason: "graph contains a cycle".into(),
            })
    }

    /// Export to d2 diagram format.
    ///
    /// One `dependent -> dependency` line per requirement, followed by every
    /// stack nothing requires on a line of its own.
    #[must_use]
    pub fn to_d2(&self) -> String {
        let mut d2 = String::new();

        for name in self.vertices() {
            for dependency in self.dependencies(name) {
                d2.push_str(&format!("{name} -> {dependency}\n"));
            }
        }
        for name in self.vertices() {
            if self.dependents(name).is_empty() {
                d2.push_str(name);
                d2.push('\n');
            }
        }

        d2
    }

    /// Export to DOT format for Graphviz
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut dot = String::from("digraph stacks {\n");
        dot.push_str("  rankdir=LR;\n");
        dot.push_str("  node [shape=box, style=rounded];\n\n");

        for name in self.vertices() {
            dot.push_str(&format!("  \"{name}\";\n"));
        }

        dot.push('\n');

        for (from, to) in self.edges() {
            dot.push_str(&format!("  \"{from}\" -> \"{to}\";\n"));
        }

        dot.push_str("}\n");
        dot
    }
}
