// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Chain command - prints the deployment order of stacks

use super::Output;
use crate::catalog::Catalog;
use anyhow::{Context, Result};

/// Run the chain command; `sorted` visits the named stacks in name order
pub fn run(catalog: &Catalog, names: &[String], sorted: bool, out: Output) -> Result<()> {
    let stacks = catalog.validate().context("Stack catalog is invalid")?;
    let chain = if sorted {
        stacks.sorted_chain(names)?
    } else {
        stacks.chain(names)?
    };

    if out.json {
        return out.print_json(&chain.names());
    }

    for (i, stack) in chain.iter().enumerate() {
        println!("{}. {}", i + 1, out.stack(&stack.name));
    }

    Ok(())
}
