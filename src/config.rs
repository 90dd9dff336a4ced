// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management
//!
//! Settings are layered: built-in defaults, then the TOML config file, then
//! `STACKCHAIN_*` environment variables.

use anyhow::{Context, Result};
use config::{Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Stack catalog file; the built-in catalog is used when unset
    pub catalog: Option<PathBuf>,
    /// Default deployment group
    pub group: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: None,
            group: "default".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Location of the user's config file
#[must_use]
pub fn default_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "hyperpolymath", "stackchain")
        .map(|d| d.config_dir().join("config.toml"))
}

/// Load configuration from disk or use defaults.
///
/// An explicit `path` must exist; the default config file is optional.
pub fn load(path: Option<&Path>) -> Result<Config> {
    let defaults = Config::default();
    let mut builder = config::Config::builder()
        .set_default("group", defaults.group)?
        .set_default("log_level", defaults.log_level)?;

    match path {
        Some(path) => {
            debug!("Loading config from {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        None => {
            if let Some(path) = default_path() {
                builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
            }
        }
    }

    builder
        .add_source(Environment::with_prefix("STACKCHAIN"))
        .build()
        .and_then(config::Config::try_deserialize)
        .context("Failed to load configuration")
}
