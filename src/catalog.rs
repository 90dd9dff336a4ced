// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Stack catalog
//!
//! The catalog is the registry of stack definitions the rest of the crate
//! works on. It is built once, either from the built-in definitions or from
//! a TOML document, and passed explicitly to validation and resolution.
//!
//! ```toml
//! [stacks.dhis2-db]
//! file = "stacks/dhis2-db/helmfile.yaml"
//! parameters = { DATABASE_NAME = "dhis2" }
//! providers = { DATABASE_HOSTNAME = { template = "{instance.name}-database-postgresql.{instance.group}.svc" } }
//!
//! [stacks.dhis2-core]
//! requires = ["dhis2-db"]
//! parameters = { DHIS2_HOME = "/opt/dhis2", DATABASE_NAME = { consumed = true } }
//! ```

use crate::error::{Result, StackError};
use crate::provider::{Constant, Provider, ProviderFn, Template};
use crate::types::{Instance, Parameter, Stack};
use crate::validate::StackSet;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Registry of stack definitions keyed by name
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    stacks: BTreeMap<String, Stack>,
}

impl Catalog {
    /// Create a catalog from stack values. A later stack replaces an earlier one of the same name.
    pub fn from_stacks(stacks: impl IntoIterator<Item = Stack>) -> Self {
        Self {
            stacks: stacks.into_iter().map(|s| (s.name.clone(), s)).collect(),
        }
    }

    /// The built-in DHIS2 stacks
    #[must_use]
    pub fn builtin() -> Self {
        let postgres_hostname: Arc<dyn Provider> = Arc::new(Template::new(
            "{instance.name}-database-postgresql.{instance.group}.svc",
        ));

        let dhis2_db = Stack::new("dhis2-db")
            .file("stacks/dhis2-db/helmfile.yaml")
            .value("DATABASE_ID", "1")
            .value("DATABASE_USERNAME", "dhis")
            .value("DATABASE_PASSWORD", "dhis")
            .value("DATABASE_NAME", "dhis2")
            .shared_provider("DATABASE_HOSTNAME", Arc::clone(&postgres_hostname))
            .provider(
                "DATABASE_GREETING",
                ProviderFn::new(|instance: &Instance| {
                    Ok(format!(
                        "hello from stack {:?} instance {:?}",
                        instance.stack.name, instance.name
                    ))
                }),
            );

        let dhis2_core = Stack::new("dhis2-core")
            .file("stacks/dhis2-core/helmfile.yaml")
            .value("DHIS2_HOME", "/opt/dhis2")
            .consumes("DATABASE_USERNAME")
            .consumes("DATABASE_PASSWORD")
            .consumes("DATABASE_NAME")
            .consumes("DATABASE_HOSTNAME")
            .consumes("DATABASE_GREETING")
            .requires(&dhis2_db);

        let dhis2 = Stack::new("dhis2")
            .file("stacks/dhis2/helmfile.yaml")
            .value("DHIS2_HOME", "/opt/dhis2")
            .value("DATABASE_USERNAME", "dhis")
            .value("DATABASE_PASSWORD", "dhis")
            .value("DATABASE_NAME", "dhis2")
            .shared_provider("DATABASE_HOSTNAME", postgres_hostname);

        let pgadmin = Stack::new("pgadmin")
            .file("stacks/pgadmin/helmfile.yaml")
            .value("PGADMIN_USERNAME", "admin")
            .value("PGADMIN_PASSWORD", "admin")
            .consumes("DATABASE_USERNAME")
            .consumes("DATABASE_PASSWORD")
            .consumes("DATABASE_NAME")
            .consumes("DATABASE_HOSTNAME")
            .requires(&dhis2_db);

        let whoami_go = Stack::new("whoami-go")
            .file("stacks/whoami-go/helmfile.yaml")
            .value("REPLICA_COUNT", "1");

        Self::from_stacks([dhis2_db, dhis2_core, dhis2, pgadmin, whoami_go])
    }

    /// Parse a catalog from a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile = toml::from_str(content)?;

        let mut builder = Builder {
            defs: &file.stacks,
            built: BTreeMap::new(),
            in_progress: Vec::new(),
        };
        for name in file.stacks.keys() {
            builder.build(name)?;
        }

        debug!("Loaded {} stack definition(s)", builder.built.len());
        Ok(Self {
            stacks: builder.built,
        })
    }

    /// Load a catalog from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| StackError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Get a stack by name
    pub fn get(&self, name: &str) -> Result<&Stack> {
        self.stacks.get(name).ok_or_else(|| StackError::UnknownStack {
            name: name.to_string(),
        })
    }

    /// Stack names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stacks.keys().map(String::as_str)
    }

    /// Iterate over stacks in name order
    pub fn stacks(&self) -> impl Iterator<Item = &Stack> {
        self.stacks.values()
    }

    /// Number of stacks
    #[must_use]
    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    /// Check if the catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// Validate every stack in the catalog
    pub fn validate(&self) -> Result<StackSet> {
        StackSet::new(self.stacks.values().cloned())
    }
}

// =============================================================================
// File format
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    #[serde(default)]
    stacks: BTreeMap<String, StackDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StackDef {
    file: Option<PathBuf>,
    #[serde(default)]
    parameters: BTreeMap<String, ParameterDef>,
    #[serde(default)]
    providers: BTreeMap<String, ProviderDef>,
    #[serde(default)]
    requires: Vec<String>,
}

/// A bare string is a default value, a table may mark the parameter consumed
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ParameterDef {
    Value(String),
    Table(ParameterTable),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ParameterTable {
    #[serde(default)]
    value: String,
    #[serde(default)]
    consumed: bool,
}

impl From<&ParameterDef> for Parameter {
    fn from(def: &ParameterDef) -> Self {
        match def {
            ParameterDef::Value(value) => Parameter::value(value.clone()),
            ParameterDef::Table(table) => Parameter {
                value: table.value.clone(),
                consumed: table.consumed,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ProviderDef {
    Template(String),
    Value(String),
}

struct Builder<'a> {
    defs: &'a BTreeMap<String, StackDef>,
    built: BTreeMap<String, Stack>,
    in_progress: Vec<String>,
}

impl Builder<'_> {
    fn build(&mut self, name: &str) -> Result<Stack> {
        if let Some(stack) = self.built.get(name) {
            return Ok(stack.clone());
        }
        if self.in_progress.iter().any(|n| n == name) {
            let dependent = self.in_progress.last().cloned().unwrap_or_default();
            return Err(StackError::CycleDetected {
                from: name.to_string(),
                to: dependent,
            });
        }

        let def = self.defs.get(name).ok_or_else(|| StackError::UnknownStack {
            name: name.to_string(),
        })?;

        let mut stack = Stack::new(name);
        stack.file.clone_from(&def.file);
        for (key, parameter) in &def.parameters {
            stack = stack.parameter(key.clone(), parameter.into());
        }
        for (key, provider) in &def.providers {
            stack = match provider {
                ProviderDef::Template(pattern) => stack.provider(key.clone(), Template::new(pattern.clone())),
                ProviderDef::Value(value) => stack.provider(key.clone(), Constant::new(value.clone())),
            };
        }

        self.in_progress.push(name.to_string());
        for required in &def.requires {
            if !self.defs.contains_key(required) {
                return Err(StackError::UnknownRequirement {
                    stack: name.to_string(),
                    name: required.clone(),
                });
            }
            let required = self.build(required)?;
            stack = stack.requires(&required);
        }
        self.in_progress.pop();

        self.built.insert(name.to_string(), stack.clone());
        Ok(stack)
    }
}
