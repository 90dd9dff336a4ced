// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Error types for stack validation and parameter resolution

use crate::provider::ProviderError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for stackchain operations
pub type Result<T> = std::result::Result<T, StackError>;

/// Main error type
#[derive(Error, Debug)]
pub enum StackError {
    // Validation errors
    /// A consumed parameter has no provider among the required stacks
    #[error("no provider for stack {stack:?} parameter {parameter:?}")]
    UnmetDependency {
        /// Consuming stack
        stack: String,
        /// Consumed parameter
        parameter: String,
    },

    /// A consumed parameter has more than one provider among the required stacks
    #[error(
        "every consumed parameter must have exactly one provider. \
         {count} provider(s) for stack {stack:?} parameter {parameter:?}"
    )]
    ConflictingProviders {
        /// Number of providers found
        count: usize,
        /// Consuming stack
        stack: String,
        /// Consumed parameter
        parameter: String,
    },

    /// Adding a requires edge would close a cycle
    #[error("edge {from:?} -> {to:?} creates cycle")]
    CycleDetected {
        /// Required stack
        from: String,
        /// Requiring stack
        to: String,
    },

    /// Any other failure while building the requires graph
    #[error("failed adding {element}: {reason}")]
    GraphConstruction {
        /// The vertex or edge being added
        element: String,
        /// What went wrong
        reason: String,
    },

    /// The same stack name was given more than once
    #[error("stack {name:?} is defined more than once")]
    DuplicateStack {
        /// Repeated name
        name: String,
    },

    /// Every violation found while validating a stack set
    #[error("{0}")]
    Invalid(Violations),

    // Resolution errors
    /// The source stack can neither supply nor provide a consumed parameter
    #[error("source stack {stack:?} cannot provide parameter {parameter:?}")]
    UnresolvableParameter {
        /// Source stack
        stack: String,
        /// Consumed parameter
        parameter: String,
    },

    /// A provider failed to compute a value
    #[error("failed to evaluate parameter {parameter:?} using source stack {stack:?}")]
    ProviderFailure {
        /// Consumed parameter
        parameter: String,
        /// Source stack
        stack: String,
        /// The provider's own error
        #[source]
        source: ProviderError,
    },

    /// No instance of the stack supplying a consumed parameter was given
    #[error("parameter {parameter:?} of stack {stack:?} needs an instance of stack {supplier:?}")]
    MissingSource {
        /// Consuming stack
        stack: String,
        /// Consumed parameter
        parameter: String,
        /// Stack expected to supply the parameter
        supplier: String,
    },

    // Catalog errors
    /// Lookup of a stack that is not defined
    #[error("unknown stack {name:?}")]
    UnknownStack {
        /// Requested name
        name: String,
    },

    /// A stack requires a stack that is not defined
    #[error("stack {stack:?} requires unknown stack {name:?}")]
    UnknownRequirement {
        /// Requiring stack
        stack: String,
        /// Missing stack
        name: String,
    },

    /// The catalog document could not be parsed
    #[error("invalid catalog: {0}")]
    Catalog(#[from] toml::de::Error),

    /// Reading a file failed
    #[error("failed to read {path:?}: {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    // Deployment errors
    /// A deployer failed
    #[error("failed deploying stack {stack:?}: {reason}")]
    Deploy {
        /// Stack being deployed
        stack: String,
        /// What went wrong
        reason: String,
    },
}

impl StackError {
    /// The individual violations carried by this error.
    ///
    /// For [`StackError::Invalid`] these are the collected violations, for
    /// every other error it is the error itself.
    #[must_use]
    pub fn violations(&self) -> &[StackError] {
        match self {
            Self::Invalid(violations) => &violations.0,
            other => std::slice::from_ref(other),
        }
    }
}

/// Collected validation violations, displayed one per line
#[derive(Debug, Default)]
pub struct Violations(Vec<StackError>);

impl Violations {
    /// Record a violation
    pub fn push(&mut self, violation: StackError) {
        self.0.push(violation);
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of violations
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the violations
    pub fn iter(&self) -> std::slice::Iter<'_, StackError> {
        self.0.iter()
    }

    /// `Ok(value)` when empty, otherwise [`StackError::Invalid`]
    pub fn into_result<T>(self, value: T) -> Result<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(StackError::Invalid(self))
        }
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl Extend<StackError> for Violations {
    fn extend<I: IntoIterator<Item = StackError>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a StackError;
    type IntoIter = std::slice::Iter<'a, StackError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
