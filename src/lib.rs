// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Stackchain library - dependency validation and parameter resolution for stacks
//!
//! A stack is a reusable unit of deployment (a database, an application, an
//! admin tool). Stacks declare the parameters their deployment template needs,
//! the parameters they can provide to stacks depending on them, and the stacks
//! they require. This crate proves a set of stacks is deployable, orders it
//! into a chain and resolves the concrete parameters of every instance.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod chain;
pub mod commands;
pub mod config;
pub mod deploy;
pub mod error;
pub mod graph;
pub mod provider;
pub mod resolve;
pub mod validate;

pub use error::{Result, StackError, Violations};

/// Core data types: parameters, stacks and instances
pub mod types {
    use crate::provider::Provider;
    use serde::{Deserialize, Serialize};
    use std::collections::{BTreeMap, HashSet};
    use std::fmt;
    use std::path::PathBuf;
    use std::sync::Arc;

    // =========================================================================
    // Parameter
    // =========================================================================

    /// A named configuration value attached to a stack.
    ///
    /// A parameter is either default-valued, in which case `value` is used
    /// as-is, or consumed, in which case `value` is ignored and the actual
    /// value comes from a required stack at deploy time.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Parameter {
        /// Default value, meaningful only when not consumed
        #[serde(default)]
        pub value: String,
        /// Whether the value is supplied by one of the required stacks
        #[serde(default)]
        pub consumed: bool,
    }

    impl Parameter {
        /// A default-valued parameter
        #[must_use]
        pub fn value(value: impl Into<String>) -> Self {
            Self {
                value: value.into(),
                consumed: false,
            }
        }

        /// A parameter provided by one of the required stacks
        #[must_use]
        pub fn consumed() -> Self {
            Self {
                value: String::new(),
                consumed: true,
            }
        }
    }

    // =========================================================================
    // Stack
    // =========================================================================

    /// A named, reusable deployment unit.
    ///
    /// Stacks are plain data and constructing one never fails. Parameter and
    /// provider maps are keyed by parameter name; the last write for a key
    /// wins.
    #[derive(Clone, Default)]
    pub struct Stack {
        /// Unique name within a stack set
        pub name: String,
        /// Path to the deployment template (e.g. a helmfile)
        pub file: Option<PathBuf>,
        /// Parameters used by the stack's deployment template
        pub parameters: BTreeMap<String, Parameter>,
        /// Parameters this stack can compute for stacks depending on it
        pub providers: BTreeMap<String, Arc<dyn Provider>>,
        /// Stacks an instance of this stack needs to be deployed
        pub requires: Vec<Stack>,
    }

    impl fmt::Debug for Stack {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("Stack")
                .field("name", &self.name)
                .field("file", &self.file)
                .field("parameters", &self.parameters)
                .field("providers", &self.providers.keys().collect::<Vec<_>>())
                .field(
                    "requires",
                    &self.requires.iter().map(|s| &s.name).collect::<Vec<_>>(),
                )
                .finish()
        }
    }

    impl Stack {
        /// Create an empty stack
        #[must_use]
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                ..Self::default()
            }
        }

        /// Set the deployment template path
        #[must_use]
        pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
            self.file = Some(path.into());
            self
        }

        /// Declare a parameter
        #[must_use]
        pub fn parameter(mut self, name: impl Into<String>, parameter: Parameter) -> Self {
            self.parameters.insert(name.into(), parameter);
            self
        }

        /// Declare a default-valued parameter
        #[must_use]
        pub fn value(self, name: impl Into<String>, value: impl Into<String>) -> Self {
            self.parameter(name, Parameter::value(value))
        }

        /// Declare a consumed parameter
        #[must_use]
        pub fn consumes(self, name: impl Into<String>) -> Self {
            self.parameter(name, Parameter::consumed())
        }

        /// Register a provider for dependents of this stack
        #[must_use]
        pub fn provider(mut self, name: impl Into<String>, provider: impl Provider + 'static) -> Self {
            self.providers.insert(name.into(), Arc::new(provider));
            self
        }

        /// Register an already shared provider
        #[must_use]
        pub fn shared_provider(mut self, name: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
            self.providers.insert(name.into(), provider);
            self
        }

        /// Add a required stack
        #[must_use]
        pub fn requires(mut self, stack: &Stack) -> Self {
            self.requires.push(stack.clone());
            self
        }

        /// Names of the consumed parameters, in key order
        pub fn consumed_parameters(&self) -> impl Iterator<Item = &str> {
            self.parameters
                .iter()
                .filter(|(_, p)| p.consumed)
                .map(|(k, _)| k.as_str())
        }

        /// Required stacks with repeated names skipped
        pub fn requirements(&self) -> impl Iterator<Item = &Stack> {
            let mut seen = HashSet::new();
            self.requires
                .iter()
                .filter(move |s| seen.insert(s.name.clone()))
        }

        /// Number of ways this stack can supply `parameter` to a dependent.
        ///
        /// A declared parameter and a provider under the same key count twice.
        #[must_use]
        pub fn supply_count(&self, parameter: &str) -> usize {
            usize::from(self.parameters.contains_key(parameter))
                + usize::from(self.providers.contains_key(parameter))
        }

        /// The first required stack able to supply `parameter`
        #[must_use]
        pub fn supplier_of(&self, parameter: &str) -> Option<&Stack> {
            self.requirements().find(|r| r.supply_count(parameter) > 0)
        }
    }

    // =========================================================================
    // Instance
    // =========================================================================

    /// A concrete, named deployment of a stack.
    ///
    /// Instances are the argument of provider invocations when their stack is
    /// the source for a stack being deployed.
    #[derive(Debug, Clone)]
    pub struct Instance {
        /// Instance name
        pub name: String,
        /// Group scoping the instance name
        pub group: String,
        /// The stack this is an instance of
        pub stack: Stack,
        /// Values assigned to this instance; only `value` is meaningful
        pub parameters: BTreeMap<String, Parameter>,
    }

    impl Instance {
        /// Create an instance without parameters
        #[must_use]
        pub fn new(name: impl Into<String>, group: impl Into<String>, stack: Stack) -> Self {
            Self {
                name: name.into(),
                group: group.into(),
                stack,
                parameters: BTreeMap::new(),
            }
        }

        /// Create an instance from resolved parameter values
        #[must_use]
        pub fn resolved(
            name: impl Into<String>,
            group: impl Into<String>,
            stack: Stack,
            values: &BTreeMap<String, String>,
        ) -> Self {
            let parameters = values
                .iter()
                .map(|(k, v)| (k.clone(), Parameter::value(v.clone())))
                .collect();
            Self {
                name: name.into(),
                group: group.into(),
                stack,
                parameters,
            }
        }

        /// Assign a parameter value
        #[must_use]
        pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
            self.parameters.insert(name.into(), Parameter::value(value));
            self
        }

        /// Look up an assigned value
        #[must_use]
        pub fn get(&self, name: &str) -> Option<&str> {
            self.parameters.get(name).map(|p| p.value.as_str())
        }
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::chain::Chain;
    pub use crate::error::{Result, StackError};
    pub use crate::provider::{Constant, Provider, ProviderError, ProviderFn, Template};
    pub use crate::resolve::{resolve, resolve_linked};
    pub use crate::types::*;
    pub use crate::validate::StackSet;
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_last_write_wins() {
        let stack = Stack::new("a").value("x", "1").value("x", "2");
        assert_eq!(stack.parameters["x"], Parameter::value("2"));

        let stack = Stack::new("a").value("x", "1").consumes("x");
        assert!(stack.parameters["x"].consumed);
    }

    #[test]
    fn test_requirements_skip_repeated_names() {
        let a = Stack::new("a");
        let b = Stack::new("b").requires(&a).requires(&a);

        assert_eq!(b.requires.len(), 2);
        assert_eq!(b.requirements().count(), 1);
    }

    #[test]
    fn test_supply_count_counts_parameter_and_provider() {
        let a = Stack::new("a")
            .value("p", "1")
            .provider("p", Constant::new("2"))
            .provider("q", Constant::new("3"));

        assert_eq!(a.supply_count("p"), 2);
        assert_eq!(a.supply_count("q"), 1);
        assert_eq!(a.supply_count("r"), 0);
    }

    #[test]
    fn test_supplier_of() {
        let db = Stack::new("db").value("user", "");
        let cache = Stack::new("cache").provider("url", Constant::new("redis://"));
        let app = Stack::new("app")
            .consumes("user")
            .consumes("url")
            .requires(&db)
            .requires(&cache);

        assert_eq!(app.supplier_of("user").map(|s| s.name.as_str()), Some("db"));
        assert_eq!(app.supplier_of("url").map(|s| s.name.as_str()), Some("cache"));
        assert!(app.supplier_of("missing").is_none());
    }

    #[test]
    fn test_consumed_parameters_in_key_order() {
        let stack = Stack::new("s").consumes("b").value("c", "").consumes("a");
        let consumed: Vec<_> = stack.consumed_parameters().collect();
        assert_eq!(consumed, vec!["a", "b"]);
    }

    #[test]
    fn test_debug_lists_names_only() {
        let a = Stack::new("a").provider("p", Constant::new("x"));
        let b = Stack::new("b").requires(&a);
        let debug = format!("{b:?}");
        assert!(debug.contains("requires: [\"a\"]"));
    }
}
