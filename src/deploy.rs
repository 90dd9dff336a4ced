// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Chain deployment
//!
//! Walks a chain in order, resolves each stack against the instances already
//! deployed and hands the parameters to a [`Deployer`]. The first failure
//! stops the walk; nothing already deployed is undone.

use crate::chain::Chain;
use crate::error::Result;
use crate::resolve::resolve_linked;
use crate::types::{Instance, Stack};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// Performs the deployment of a single stack instance
pub trait Deployer {
    /// Deploy `stack` as instance `name` in `group` and return the deployed instance
    fn deploy(
        &mut self,
        stack: &Stack,
        name: &str,
        group: &str,
        parameters: &BTreeMap<String, String>,
    ) -> Result<Instance>;
}

/// Record of one deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deployment {
    /// Instance name
    pub instance: String,
    /// Instance group
    pub group: String,
    /// Deployed stack
    pub stack: String,
    /// Deployment template of the stack
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Resolved parameters
    pub parameters: BTreeMap<String, String>,
}

/// Deployer that only records what it would deploy
#[derive(Debug, Default)]
pub struct DryRun {
    deployments: Vec<Deployment>,
}

impl DryRun {
    /// Create an empty dry run
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deployments in the order they happened
    #[must_use]
    pub fn deployments(&self) -> &[Deployment] {
        &self.deployments
    }
}

impl Deployer for DryRun {
    fn deploy(
        &mut self,
        stack: &Stack,
        name: &str,
        group: &str,
        parameters: &BTreeMap<String, String>,
    ) -> Result<Instance> {
        info!("Would deploy {} as {} in group {}", stack.name, name, group);
        self.deployments.push(Deployment {
            instance: name.to_string(),
            group: group.to_string(),
            stack: stack.name.clone(),
            file: stack.file.as_ref().map(|f| f.display().to_string()),
            parameters: parameters.clone(),
        });
        Ok(Instance::resolved(name, group, stack.clone(), parameters))
    }
}

/// Name of the instance of `stack` deployed in `group`
#[must_use]
pub fn instance_name(group: &str, stack: &Stack) -> String {
    format!("{group}-{}", stack.name)
}

/// Deploy every stack of `chain` in order.
///
/// Each stack is resolved against the instances deployed before it, so the
/// chain must list required stacks first.
pub fn deploy_chain(chain: &Chain, group: &str, deployer: &mut impl Deployer) -> Result<Vec<Instance>> {
    info!("Deploying stack chain {:?}", chain.names());

    let mut instances: Vec<Instance> = Vec::with_capacity(chain.len());
    for stack in chain {
        let parameters = resolve_linked(stack, &instances)?;
        let name = instance_name(group, stack);
        let instance = deployer.deploy(stack, &name, group, &parameters)?;
        instances.push(instance);
    }

    Ok(instances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::error::StackError;

    struct Failing;

    impl Deployer for Failing {
        fn deploy(
            &mut self,
            stack: &Stack,
            _name: &str,
            _group: &str,
            _parameters: &BTreeMap<String, String>,
        ) -> Result<Instance> {
            Err(StackError::Deploy {
                stack: stack.name.clone(),
                reason: "cluster unreachable".into(),
            })
        }
    }

    #[test]
    fn test_deploy_builtin_chain() {
        let stacks = Catalog::builtin().validate().unwrap();
        let chain = stacks.chain(&["dhis2-core"]).unwrap();

        let mut deployer = DryRun::new();
        let instances = deploy_chain(&chain, "whoami", &mut deployer).unwrap();

        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].name, "whoami-dhis2-db");

        let core = &deployer.deployments()[1];
        assert_eq!(core.stack, "dhis2-core");
        assert_eq!(core.parameters["DATABASE_NAME"], "dhis2");
        assert_eq!(
            core.parameters["DATABASE_HOSTNAME"],
            "whoami-dhis2-db-database-postgresql.whoami.svc"
        );
        assert_eq!(
            core.parameters["DATABASE_GREETING"],
            r#"hello from stack "dhis2-db" instance "whoami-dhis2-db""#
        );
    }

    #[test]
    fn test_deploy_stops_at_first_failure() {
        let stacks = Catalog::builtin().validate().unwrap();
        let chain = stacks.chain(&["pgadmin"]).unwrap();

        let err = deploy_chain(&chain, "g", &mut Failing).unwrap_err();
        assert!(err.to_string().contains("dhis2-db"));
    }

    #[test]
    fn test_resolution_failure_aborts() {
        use crate::provider::{ProviderError, ProviderFn};

        let db = Stack::new("db").provider(
            "host",
            ProviderFn::new(|_: &Instance| Err(ProviderError::failed("no address assigned"))),
        );
        let app = Stack::new("app").consumes("host").requires(&db);
        let chain = Chain::new([&app]);

        let mut deployer = DryRun::new();
        let err = deploy_chain(&chain, "g", &mut deployer).unwrap_err();
        assert!(matches!(err, StackError::ProviderFailure { .. }));
        assert_eq!(deployer.deployments().len(), 1);
        assert_eq!(deployer.deployments()[0].stack, "db");
    }
}
