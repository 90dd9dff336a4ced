// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Stackchain CLI - validate, order and resolve stack deployments

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use stackchain::commands::{self, diagram::DiagramFormat, resolve::ResolveArgs, Output};
use stackchain::config;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload};

#[derive(Parser)]
#[command(name = "stackchain")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "STACKCHAIN_CONFIG")]
    config: Option<PathBuf>,

    /// Stack catalog file (built-in catalog if not specified)
    #[arg(long, env = "STACKCHAIN_CATALOG")]
    catalog: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the stack catalog
    Validate,

    /// Print the deployment order of stacks and everything they require
    Chain {
        /// Stacks to deploy
        #[arg(required = true)]
        stacks: Vec<String>,

        /// Visit the given stacks in name order instead of argument order
        #[arg(long)]
        sorted: bool,
    },

    /// Render the requires graph
    Diagram {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = DiagramFormat::D2)]
        format: DiagramFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve the parameters of a stack linked to an instance of another
    Resolve {
        /// Stack whose parameters are resolved
        target: String,

        /// Stack of the source instance
        #[arg(long)]
        source: String,

        /// Source instance name (default: <GROUP>-<SOURCE>)
        #[arg(long)]
        name: Option<String>,

        /// Source instance group (default from config)
        #[arg(long)]
        group: Option<String>,

        /// Parameter assigned to the source instance
        #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = commands::parse_key_val)]
        params: Vec<(String, String)>,
    },

    /// Dry-run deployment of stacks and everything they require
    Deploy {
        /// Stacks to deploy
        #[arg(required = true)]
        stacks: Vec<String>,

        /// Deployment group (default from config)
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging from the flags; the configured level applies when none is given
    let (filter, filter_handle) = reload::Layer::new(match cli.verbose {
        0 if cli.quiet => LevelFilter::ERROR,
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = config::load(cli.config.as_deref())?;
    if cli.verbose == 0 && !cli.quiet {
        if let Ok(level) = config.log_level.parse::<tracing::Level>() {
            filter_handle.reload(LevelFilter::from_level(level))?;
        }
    }

    let out = Output {
        json: cli.json,
        color: !cli.no_color && std::io::stdout().is_terminal(),
    };

    let catalog_path = cli.catalog.or(config.catalog);
    let load_catalog = || commands::load_catalog(catalog_path.as_deref());

    // Execute command
    match cli.command {
        Commands::Validate => commands::validate::run(&load_catalog()?, out),
        Commands::Chain { stacks, sorted } => {
            commands::chain::run(&load_catalog()?, &stacks, sorted, out)
        }
        Commands::Diagram { format, output } => {
            commands::diagram::run(&load_catalog()?, format, output.as_deref())
        }
        Commands::Resolve {
            target,
            source,
            name,
            group,
            params,
        } => {
            let args = ResolveArgs {
                target,
                source,
                name,
                group: group.unwrap_or(config.group),
                params,
            };
            commands::resolve::run(&load_catalog()?, &args, out)
        }
        Commands::Deploy { stacks, group } => {
            let group = group.unwrap_or(config.group);
            commands::deploy::run(&load_catalog()?, &stacks, &group, out)
        }
        Commands::Completions { shell } => commands::completions::run(shell, &mut Cli::command()),
    }
}
