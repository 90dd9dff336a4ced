// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Completions command - writes a shell completion script to stdout

use anyhow::Result;
use clap::Command;
use clap_complete::Shell;
use std::io;

/// Run the completions command for the CLI described by `cmd`
pub fn run(shell: Shell, cmd: &mut Command) -> Result<()> {
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, cmd, name, &mut io::stdout());
    Ok(())
}
