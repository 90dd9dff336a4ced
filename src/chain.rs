// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Deployment chains
//!
//! A chain lists stacks in an order safe to deploy: every stack comes after
//! all stacks it transitively requires. Stacks are collected in depth-first
//! post-order, visiting requirements in the order they are declared.

use crate::types::Stack;
use std::collections::HashSet;

/// Ordered, deduplicated sequence of stacks to be deployed in order
#[derive(Debug, Clone, Default)]
pub struct Chain {
    stacks: Vec<Stack>,
}

impl Chain {
    /// Create the chain of `stacks` and all their required stacks.
    ///
    /// Stacks are identified by name; repeated stacks are ignored. The input
    /// is expected to have passed validation. A stack is marked visited
    /// before its requirements, so a cyclic input terminates with an order
    /// that is not meaningful.
    pub fn new<'a>(stacks: impl IntoIterator<Item = &'a Stack>) -> Self {
        let mut chain = Self::default();
        let mut visited = HashSet::new();

        for stack in stacks {
            if !visited.contains(&stack.name) {
                chain.visit(stack, &mut visited);
            }
        }

        chain
    }

    /// Like [`Chain::new`] with the inputs sorted by name first
    pub fn sorted<'a>(stacks: impl IntoIterator<Item = &'a Stack>) -> Self {
        let mut stacks: Vec<&Stack> = stacks.into_iter().collect();
        stacks.sort_by(|a, b| a.name.cmp(&b.name));
        Self::new(stacks)
    }

    // Required stacks, i.e. vertices without outgoing edges, are appended first.
    fn visit(&mut self, stack: &Stack, visited: &mut HashSet<String>) {
        visited.insert(stack.name.clone());
        for required in &stack.requires {
            if !visited.contains(&required.name) {
                self.visit(required, visited);
            }
        }
        self.stacks.push(stack.clone());
    }

    /// Stacks in deployment order
    #[must_use]
    pub fn stacks(&self) -> &[Stack] {
        &self.stacks
    }

    /// Stack names in deployment order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.stacks.iter().map(|s| s.name.as_str()).collect()
    }

    /// Position of a stack in the chain
    #[must_use]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.stacks.iter().position(|s| s.name == name)
    }

    /// Iterate over stacks in deployment order
    pub fn iter(&self) -> std::slice::Iter<'_, Stack> {
        self.stacks.iter()
    }

    /// Number of stacks
    #[must_use]
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    /// Check if the chain is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a Stack;
    type IntoIter = std::slice::Iter<'a, Stack>;

    fn into_iter(self) -> Self::IntoIter {
        self.stacks.iter()
    }
}
