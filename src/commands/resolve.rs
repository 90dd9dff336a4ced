// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Resolve command - computes the parameters of a stack linked to an instance

use super::Output;
use crate::catalog::Catalog;
use crate::resolve::resolve;
use crate::types::Instance;
use anyhow::{Context, Result};
use std::collections::BTreeMap;

/// Arguments for the resolve command
#[derive(Debug, Clone, Default)]
pub struct ResolveArgs {
    /// Stack whose parameters are resolved
    pub target: String,
    /// Stack of the source instance
    pub source: String,
    /// Source instance name; defaults to `<group>-<source>`
    pub name: Option<String>,
    /// Source instance group
    pub group: String,
    /// Parameters assigned to the source instance
    pub params: Vec<(String, String)>,
}

/// Build the source instance described by `args`.
///
/// The instance starts from the default values of the source stack's
/// parameters; explicit `params` override them.
pub fn source_instance(catalog: &Catalog, args: &ResolveArgs) -> Result<Instance> {
    let stack = catalog.get(&args.source)?;
    let name = args
        .name
        .clone()
        .unwrap_or_else(|| format!("{}-{}", args.group, stack.name));

    let mut values: BTreeMap<&str, &str> = stack
        .parameters
        .iter()
        .filter(|(_, p)| !p.consumed)
        .map(|(k, p)| (k.as_str(), p.value.as_str()))
        .collect();
    for (k, v) in &args.params {
        values.insert(k, v);
    }

    Ok(values
        .into_iter()
        .fold(Instance::new(name, args.group.as_str(), stack.clone()), |instance, (k, v)| {
            instance.parameter(k, v)
        }))
}

/// Run the resolve command
pub fn run(catalog: &Catalog, args: &ResolveArgs, out: Output) -> Result<()> {
    let target = catalog.get(&args.target)?;
    let source = source_instance(catalog, args)?;

    let values = resolve(target, &source).with_context(|| {
        format!(
            "Failed to resolve {} linked to instance {}",
            target.name, source.name
        )
    })?;

    if out.json {
        return out.print_json(&values);
    }

    for (k, v) in &values {
        println!("{} = {}", out.key(k), v);
    }

    Ok(())
}
