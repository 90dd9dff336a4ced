// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Stack set validation
//!
//! A set of stacks is accepted only if
//!
//! 1. no two stacks share a name,
//! 2. every consumed parameter of every stack has exactly one provider
//!    among the stack's required stacks, counting both their declared
//!    parameters and their providers, and
//! 3. the requires graph has no cycle.
//!
//! All checks run and every violation is reported together.

use crate::chain::Chain;
use crate::error::{Result, StackError, Violations};
use crate::graph::RequiresGraph;
use crate::types::Stack;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// A validated set of stacks keyed by name
#[derive(Debug, Clone, Default)]
pub struct StackSet {
    stacks: BTreeMap<String, Stack>,
    graph: RequiresGraph,
}

impl StackSet {
    /// Validate `stacks` and collect them into a set
    pub fn new(stacks: impl IntoIterator<Item = Stack>) -> Result<Self> {
        let stacks: Vec<Stack> = stacks.into_iter().collect();
        debug!("Validating {} stack(s)", stacks.len());

        let mut violations = Violations::default();
        violations.extend(duplicate_names(&stacks));
        violations.extend(consumed_parameters(&stacks));

        let graph = match requires_graph(&stacks) {
            Ok(graph) => graph,
            Err(err) => {
                violations.push(err);
                RequiresGraph::default()
            }
        };

        if !violations.is_empty() {
            debug!("Rejected stack set with {} violation(s)", violations.len());
        }

        let stacks = stacks.into_iter().map(|s| (s.name.clone(), s)).collect();
        violations.into_result(Self { stacks, graph })
    }

    /// Get a stack by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Stack> {
        self.stacks.get(name)
    }

    /// Stack names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stacks.keys().map(String::as_str)
    }

    /// Iterate over stacks in name order
    pub fn iter(&self) -> impl Iterator<Item = &Stack> {
        self.stacks.values()
    }

    /// Number of stacks
    #[must_use]
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    /// Check if the set is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// The requires graph built during validation
    #[must_use]
    pub fn graph(&self) -> &RequiresGraph {
        &self.graph
    }

    /// Name of the required stack supplying `parameter` to stack `name`
    #[must_use]
    pub fn provider_of(&self, name: &str, parameter: &str) -> Option<&str> {
        self.get(name)?
            .supplier_of(parameter)
            .map(|s| s.name.as_str())
    }

    /// Build the deployment chain of the named stacks
    pub fn chain<S: AsRef<str>>(&self, names: &[S]) -> Result<Chain> {
        Ok(Chain::new(self.lookup(names)?))
    }

    /// Like [`StackSet::chain`] with the named stacks visited in name order
    pub fn sorted_chain<S: AsRef<str>>(&self, names: &[S]) -> Result<Chain> {
        Ok(Chain::sorted(self.lookup(names)?))
    }

    fn lookup<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<&Stack>> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.get(name).ok_or_else(|| StackError::UnknownStack {
                    name: name.to_string(),
                })
            })
            .collect()
    }
}

fn duplicate_names(stacks: &[Stack]) -> Vec<StackError> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    stacks
        .iter()
        .filter(|s| !seen.insert(s.name.as_str()) && reported.insert(s.name.as_str()))
        .map(|s| StackError::DuplicateStack {
            name: s.name.clone(),
        })
        .collect()
}

fn consumed_parameters(stacks: &[Stack]) -> Vec<StackError> {
    let mut errs = Vec::new();

    for stack in stacks {
        let mut freq: BTreeMap<&str, usize> =
            stack.consumed_parameters().map(|p| (p, 0)).collect();

        // one level only: a required stack's own consumed parameters count as supply
        for required in stack.requirements() {
            for (parameter, count) in &mut freq {
                *count += required.supply_count(parameter);
            }
        }

        for (parameter, count) in freq {
            match count {
                0 => errs.push(StackError::UnmetDependency {
                    stack: stack.name.clone(),
                    parameter: parameter.to_string(),
                }),
                1 => {}
                count => errs.push(StackError::ConflictingProviders {
                    count,
                    stack: stack.name.clone(),
                    parameter: parameter.to_string(),
                }),
            }
        }
    }

    errs
}

fn requires_graph(stacks: &[Stack]) -> Result<RequiresGraph> {
    let mut graph = RequiresGraph::new();

    for stack in stacks {
        graph.add_vertex(&stack.name);
    }
    for stack in stacks {
        for required in stack.requirements() {
            graph.add_vertex(&required.name);
        }
    }
    for stack in stacks {
        for required in stack.requirements() {
            graph.add_edge(&required.name, &stack.name)?;
        }
    }

    debug!(
        "Requires graph has {} vertices and {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}
