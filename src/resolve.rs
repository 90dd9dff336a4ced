// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Parameter resolution
//!
//! Resolving a target stack against a source instance yields the value of
//! every parameter the target declares:
//!
//! - a default-valued parameter resolves to its own value,
//! - a consumed parameter resolves to the source instance's parameter of the
//!   same name, or else to the value computed by the source stack's provider
//!   of that name.
//!
//! Resolution is all-or-nothing. Providers are invoked at most once per
//! parameter and their failures are propagated as-is.

use crate::error::{Result, StackError};
use crate::types::{Instance, Stack};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Resolve the parameters of `target` linked to a single `source` instance
pub fn resolve(target: &Stack, source: &Instance) -> Result<BTreeMap<String, String>> {
    debug!(
        "Resolving {} linked to {} ({})",
        target.name, source.name, source.stack.name
    );

    let mut values = BTreeMap::new();
    for (name, parameter) in &target.parameters {
        let value = if parameter.consumed {
            consume(name, source)?
        } else {
            parameter.value.clone()
        };
        values.insert(name.clone(), value);
    }

    Ok(values)
}

/// Resolve the parameters of `target` linked to one instance per required stack.
///
/// Each consumed parameter is looked up on the instance of the required stack
/// supplying it. Instances of stacks `target` does not require are ignored.
pub fn resolve_linked(target: &Stack, sources: &[Instance]) -> Result<BTreeMap<String, String>> {
    debug!(
        "Resolving {} linked to {} instance(s)",
        target.name,
        sources.len()
    );

    let mut values = BTreeMap::new();
    for (name, parameter) in &target.parameters {
        if !parameter.consumed {
            values.insert(name.clone(), parameter.value.clone());
            continue;
        }

        let supplier = target
            .supplier_of(name)
            .ok_or_else(|| StackError::UnmetDependency {
                stack: target.name.clone(),
                parameter: name.clone(),
            })?;
        let source = sources
            .iter()
            .find(|i| i.stack.name == supplier.name)
            .ok_or_else(|| StackError::MissingSource {
                stack: target.name.clone(),
                parameter: name.clone(),
                supplier: supplier.name.clone(),
            })?;

        values.insert(name.clone(), consume(name, source)?);
    }

    Ok(values)
}

fn consume(name: &str, source: &Instance) -> Result<String> {
    // find parameter on the source instance first
    if let Some(value) = source.get(name) {
        trace!("{} taken from instance {}", name, source.name);
        return Ok(value.to_string());
    }

    // then on the source stack's providers
    let provider = source
        .stack
        .providers
        .get(name)
        .ok_or_else(|| StackError::UnresolvableParameter {
            stack: source.stack.name.clone(),
            parameter: name.to_string(),
        })?;

    let value = provider
        .provide(source)
        .map_err(|source_err| StackError::ProviderFailure {
            parameter: name.to_string(),
            stack: source.stack.name.clone(),
            source: source_err,
        })?;
    trace!("{} provided by stack {}", name, source.stack.name);

    Ok(value)
}
