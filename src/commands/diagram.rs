// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Diagram command - renders the requires graph

use crate::catalog::Catalog;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Supported diagram formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DiagramFormat {
    /// D2 diagram language
    D2,
    /// Graphviz DOT
    Dot,
}

/// Run the diagram command
pub fn run(catalog: &Catalog, format: DiagramFormat, output: Option<&Path>) -> Result<()> {
    let stacks = catalog.validate().context("Stack catalog is invalid")?;
    let graph = stacks.graph();

    let content = match format {
        DiagramFormat::D2 => graph.to_d2(),
        DiagramFormat::Dot => graph.to_dot(),
    };

    match output {
        Some(path) => {
            fs::write(path, &content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote diagram to {}", path.display());
        }
        None => print!("{content}"),
    }

    Ok(())
}
