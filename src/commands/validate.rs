// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Validate command - checks every stack of the catalog

use super::Output;
use crate::catalog::Catalog;
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct Report<'a> {
    valid: bool,
    stacks: Vec<&'a str>,
    edges: Vec<(&'a str, &'a str)>,
}

/// Run the validate command
pub fn run(catalog: &Catalog, out: Output) -> Result<()> {
    info!("Validating {} stack(s)", catalog.len());

    let stacks = catalog.validate().context("Stack catalog is invalid")?;
    let graph = stacks.graph();

    if out.json {
        return out.print_json(&Report {
            valid: true,
            stacks: stacks.names().collect(),
            edges: graph.edges(),
        });
    }

    println!(
        "{}",
        out.ok(&format!(
            "{} stack(s) valid, {} requirement(s)",
            stacks.len(),
            graph.edge_count()
        ))
    );
    for stack in stacks.iter() {
        let requires: Vec<&str> = graph.dependencies(&stack.name);
        if requires.is_empty() {
            println!("  {}", out.stack(&stack.name));
        } else {
            println!("  {} (requires {})", out.stack(&stack.name), requires.join(", "));
        }
    }

    Ok(())
}
