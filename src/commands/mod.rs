// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod chain;
pub mod completions;
pub mod deploy;
pub mod diagram;
pub mod resolve;
pub mod validate;

use crate::catalog::Catalog;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// How command results are written to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    /// Emit JSON instead of text
    pub json: bool,
    /// Use ANSI colors in text output
    pub color: bool,
}

impl Output {
    /// Print a value as pretty JSON
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Format a success marker line
    #[must_use]
    pub fn ok(&self, msg: &str) -> String {
        if self.color {
            format!("{} {}", "✓".green(), msg)
        } else {
            format!("✓ {msg}")
        }
    }

    /// Format a stack name
    #[must_use]
    pub fn stack(&self, name: &str) -> String {
        if self.color {
            name.cyan().bold().to_string()
        } else {
            name.to_string()
        }
    }

    /// Format a parameter key
    #[must_use]
    pub fn key(&self, key: &str) -> String {
        if self.color {
            key.yellow().to_string()
        } else {
            key.to_string()
        }
    }
}

/// Load the catalog at `path`, or the built-in catalog when none is given
pub fn load_catalog(path: Option<&Path>) -> Result<Catalog> {
    match path {
        Some(path) => {
            debug!("Loading catalog from {}", path.display());
            Catalog::load(path).with_context(|| format!("Failed to load catalog {}", path.display()))
        }
        None => {
            debug!("Using built-in catalog");
            Ok(Catalog::builtin())
        }
    }
}

/// Parse a `KEY=VALUE` command line argument
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid KEY=VALUE: no `=` found in `{s}`"))?;
    if key.is_empty() {
        return Err(format!("invalid KEY=VALUE: empty key in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_val() {
        assert_eq!(
            parse_key_val("DATABASE_NAME=mono").unwrap(),
            ("DATABASE_NAME".to_string(), "mono".to_string())
        );
        assert_eq!(parse_key_val("A=b=c").unwrap().1, "b=c");
        assert_eq!(parse_key_val("A=").unwrap().1, "");
        assert!(parse_key_val("novalue").is_err());
        assert!(parse_key_val("=x").is_err());
    }

    #[test]
    fn test_plain_output() {
        let out = Output::default();
        assert_eq!(out.ok("done"), "✓ done");
        assert_eq!(out.stack("db"), "db");
    }

    #[test]
    fn test_builtin_catalog_when_no_path() {
        let catalog = load_catalog(None).unwrap();
        assert!(catalog.get("dhis2-core").is_ok());
    }
}
