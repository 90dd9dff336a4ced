// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Deploy command - dry-run deployment of a stack chain

use super::Output;
use crate::catalog::Catalog;
use crate::deploy::{deploy_chain, DryRun};
use anyhow::{Context, Result};

/// Run the deploy command
pub fn run(catalog: &Catalog, names: &[String], group: &str, out: Output) -> Result<()> {
    let stacks = catalog.validate().context("Stack catalog is invalid")?;
    let chain = stacks.chain(names)?;

    let mut deployer = DryRun::new();
    deploy_chain(&chain, group, &mut deployer)
        .with_context(|| format!("Failed to deploy chain into group {group}"))?;

    if out.json {
        return out.print_json(deployer.deployments());
    }

    println!("Dry-run: would deploy {} stack(s) into group {}", chain.len(), group);
    for (i, deployment) in deployer.deployments().iter().enumerate() {
        println!();
        println!(
            "{}. {} as {}",
            i + 1,
            out.stack(&deployment.stack),
            deployment.instance
        );
        if let Some(file) = &deployment.file {
            println!("   file: {file}");
        }
        for (k, v) in &deployment.parameters {
            println!("   {} = {}", out.key(k), v);
        }
    }

    Ok(())
}
