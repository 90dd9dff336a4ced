// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Parameter providers
//!
//! A provider computes the value of a parameter for stacks depending on the
//! stack it is registered on, given a concrete instance of that stack.
//! Providers are either wrapped functions ([`ProviderFn`]) or data
//! ([`Template`], [`Constant`]); a catalog loaded from a file can only
//! express the latter.
//!
//! A provider that reaches out to a live system must bound its own wait and
//! fail with [`ProviderError::TimedOut`]. Callers never retry providers.

use crate::types::Instance;
use thiserror::Error;

/// Failure computing a parameter value
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider could not compute a value
    #[error("{0}")]
    Failed(String),

    /// The provider did not finish before its deadline
    #[error("provider timed out")]
    TimedOut,
}

impl ProviderError {
    /// Shorthand for [`ProviderError::Failed`]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }
}

/// Computes a parameter value from an instance of the providing stack
pub trait Provider: Send + Sync {
    /// Compute the value for `instance`
    fn provide(&self, instance: &Instance) -> Result<String, ProviderError>;
}

/// Provider backed by a function
pub struct ProviderFn<F>(F);

impl<F> ProviderFn<F>
where
    F: Fn(&Instance) -> Result<String, ProviderError> + Send + Sync,
{
    /// Wrap `f` as a provider
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Provider for ProviderFn<F>
where
    F: Fn(&Instance) -> Result<String, ProviderError> + Send + Sync,
{
    fn provide(&self, instance: &Instance) -> Result<String, ProviderError> {
        (self.0)(instance)
    }
}

/// Provider always returning the same value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant(String);

impl Constant {
    /// Create a constant provider
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl Provider for Constant {
    fn provide(&self, _instance: &Instance) -> Result<String, ProviderError> {
        Ok(self.0.clone())
    }
}

/// Provider rendering a string pattern against the instance.
///
/// Supported placeholders:
///
/// | Placeholder        | Value                              |
/// |--------------------|------------------------------------|
/// | `{instance.name}`  | instance name                      |
/// | `{instance.group}` | instance group                     |
/// | `{stack.name}`     | name of the instance's stack       |
/// | `{param.KEY}`      | value of instance parameter `KEY`  |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pattern: String,
}

impl Template {
    /// Create a template provider
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    fn lookup<'a>(key: &str, instance: &'a Instance) -> Result<&'a str, ProviderError> {
        match key {
            "instance.name" => Ok(&instance.name),
            "instance.group" => Ok(&instance.group),
            "stack.name" => Ok(&instance.stack.name),
            _ => match key.strip_prefix("param.") {
                Some(param) => instance.get(param).ok_or_else(|| {
                    ProviderError::failed(format!(
                        "instance {:?} has no parameter {param:?}",
                        instance.name
                    ))
                }),
                None => Err(ProviderError::failed(format!("unknown placeholder {{{key}}}"))),
            },
        }
    }
}

impl Provider for Template {
    fn provide(&self, instance: &Instance) -> Result<String, ProviderError> {
        let mut out = String::with_capacity(self.pattern.len());
        let mut rest = self.pattern.as_str();

        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let end = after.find('}').ok_or_else(|| {
                ProviderError::failed(format!("unterminated placeholder in {:?}", self.pattern))
            })?;
            out.push_str(Self::lookup(after[..end].trim(), instance)?);
            rest = &after[end + 1..];
        }
        out.push_str(rest);

        Ok(out)
    }
}
