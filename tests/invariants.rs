// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Invariant tests for validation, chains and resolution
//!
//! These tests verify critical invariants:
//! 1. Satisfiability - accepted sets have exactly one supplier per consumed parameter
//! 2. Acyclicity - a set is rejected exactly when its requires graph has a cycle
//! 3. Chain order - every stack appears once, after everything it requires
//! 4. Resolution - a satisfiable source yields one value per declared parameter

use proptest::prelude::*;
use stackchain::catalog::Catalog;
use stackchain::chain::Chain;
use stackchain::provider::Constant;
use stackchain::resolve::resolve;
use stackchain::types::{Instance, Stack};
use stackchain::validate::StackSet;
use stackchain::StackError;
use std::collections::HashSet;

// =============================================================================
// Test Helpers
// =============================================================================

const KEYS: [&str; 4] = ["a", "b", "c", "d"];

#[derive(Debug, Clone)]
struct StackDef {
    values: Vec<usize>,
    provided: Vec<usize>,
    consumed: Vec<usize>,
    requires: Vec<usize>,
}

/// Stack definitions where stack `i` may only require stacks before it
fn stack_defs() -> impl Strategy<Value = Vec<StackDef>> {
    prop::collection::vec(
        (
            prop::collection::vec(0..KEYS.len(), 0..3),
            prop::collection::vec(0..KEYS.len(), 0..3),
            prop::collection::vec(0..KEYS.len(), 0..3),
            prop::collection::vec(any::<prop::sample::Index>(), 0..3),
        ),
        1..8,
    )
    .prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (values, provided, consumed, requires))| StackDef {
                values,
                provided,
                consumed,
                requires: if i == 0 {
                    Vec::new()
                } else {
                    requires.iter().map(|ix| ix.index(i)).collect()
                },
            })
            .collect()
    })
}

fn build(defs: &[StackDef]) -> Vec<Stack> {
    let mut stacks: Vec<Stack> = Vec::with_capacity(defs.len());
    for (i, def) in defs.iter().enumerate() {
        let mut stack = Stack::new(format!("s{i}"));
        for &k in &def.values {
            stack = stack.value(KEYS[k], format!("v{i}"));
        }
        for &k in &def.provided {
            stack = stack.provider(KEYS[k], Constant::new(format!("p{i}")));
        }
        for &k in &def.consumed {
            stack = stack.consumes(KEYS[k]);
        }
        for &r in &def.requires {
            stack = stack.requires(&stacks[r]);
        }
        stacks.push(stack);
    }
    stacks
}

/// Requirement lists where stack `i` may also require itself or a later stack,
/// encoded as `(target, is_back_edge)` pairs
fn requires_lists() -> impl Strategy<Value = Vec<Vec<(usize, bool)>>> {
    prop::collection::vec(
        prop::collection::vec((any::<prop::sample::Index>(), any::<bool>()), 0..3),
        1..8,
    )
    .prop_map(|raw| {
        let n = raw.len();
        raw.into_iter()
            .enumerate()
            .map(|(i, requires)| {
                requires
                    .into_iter()
                    .filter(|&(_, back)| back || i > 0)
                    .map(|(ix, back)| {
                        if back {
                            (i + ix.index(n - i), true)
                        } else {
                            (ix.index(i), false)
                        }
                    })
                    .collect()
            })
            .collect()
    })
}

/// Later stacks can't be cloned yet, so back edges point at name-only stand-ins
fn build_with_back_edges(requires: &[Vec<(usize, bool)>]) -> Vec<Stack> {
    let mut stacks: Vec<Stack> = Vec::with_capacity(requires.len());
    for (i, edges) in requires.iter().enumerate() {
        let mut stack = Stack::new(format!("s{i}"));
        for &(j, back) in edges {
            stack = if back {
                stack.requires(&Stack::new(format!("s{j}")))
            } else {
                stack.requires(&stacks[j])
            };
        }
        stacks.push(stack);
    }
    stacks
}

/// Kahn's algorithm over `stack -> required` edges
fn has_cycle(requires: &[Vec<(usize, bool)>]) -> bool {
    let n = requires.len();
    let edges: HashSet<(usize, usize)> = requires
        .iter()
        .enumerate()
        .flat_map(|(i, edges)| edges.iter().map(move |&(j, _)| (i, j)))
        .collect();

    let mut indegree = vec![0usize; n];
    for &(_, j) in &edges {
        indegree[j] += 1;
    }
    let mut ready: Vec<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut seen = 0;
    while let Some(i) = ready.pop() {
        seen += 1;
        for &(from, to) in &edges {
            if from == i {
                indegree[to] -= 1;
                if indegree[to] == 0 {
                    ready.push(to);
                }
            }
        }
    }
    seen < n
}

fn supply_count(stack: &Stack, parameter: &str) -> usize {
    let mut seen = HashSet::new();
    stack
        .requires
        .iter()
        .filter(|r| seen.insert(r.name.clone()))
        .map(|r| {
            usize::from(r.parameters.contains_key(parameter))
                + usize::from(r.providers.contains_key(parameter))
        })
        .sum()
}

fn satisfiable(stacks: &[Stack]) -> bool {
    stacks.iter().all(|s| {
        s.parameters
            .iter()
            .filter(|(_, p)| p.consumed)
            .all(|(k, _)| supply_count(s, k) == 1)
    })
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn prop_accepted_iff_every_consumed_parameter_has_one_supplier(defs in stack_defs()) {
        let stacks = build(&defs);
        let expected = satisfiable(&stacks);

        match StackSet::new(stacks.clone()) {
            Ok(set) => {
                prop_assert!(expected);
                for stack in set.iter() {
                    for parameter in stack.consumed_parameters() {
                        prop_assert_eq!(supply_count(stack, parameter), 1);
                    }
                }
            }
            Err(err) => {
                prop_assert!(!expected);
                prop_assert!(err.violations().iter().all(|v| matches!(
                    v,
                    StackError::UnmetDependency { .. } | StackError::ConflictingProviders { .. }
                )), "unexpected violation kind: {:?}", err.violations());
            }
        }
    }

    #[test]
    fn prop_rejected_iff_requires_cycle(requires in requires_lists()) {
        let stacks = build_with_back_edges(&requires);

        match StackSet::new(stacks.clone()) {
            Ok(set) => {
                prop_assert!(!has_cycle(&requires));
                let order = set.graph().topological_order().unwrap();
                prop_assert_eq!(order.len(), stacks.len());
                for (dependency, dependent) in set.graph().edges() {
                    let from = order.iter().position(|n| *n == dependency).unwrap();
                    let to = order.iter().position(|n| *n == dependent).unwrap();
                    prop_assert!(from < to);
                }
            }
            Err(err) => {
                prop_assert!(has_cycle(&requires));
                prop_assert!(
                    matches!(err.violations(), [StackError::CycleDetected { .. }]),
                    "expected a single CycleDetected, got {:?}",
                    err.violations()
                );
            }
        }
    }

    #[test]
    fn prop_chain_is_complete_and_ordered(defs in stack_defs()) {
        let stacks = build(&defs);
        let chain = Chain::new(stacks.iter().rev());

        let names: HashSet<&str> = chain.names().into_iter().collect();
        prop_assert_eq!(names.len(), chain.len());
        prop_assert_eq!(chain.len(), stacks.len());

        for (i, stack) in chain.iter().enumerate() {
            for required in &stack.requires {
                let pos = chain.position(&required.name).unwrap();
                prop_assert!(pos < i, "{} must precede {}", required.name, stack.name);
            }
        }
    }

    #[test]
    fn prop_resolution_is_total_and_keeps_defaults(defs in stack_defs(), pick in any::<prop::sample::Index>()) {
        let stacks = build(&defs);
        let target = &stacks[pick.index(stacks.len())];

        let source = target
            .consumed_parameters()
            .fold(Instance::new("src", "g", Stack::new("source")), |i, k| {
                i.parameter(k, format!("from-{k}"))
            });

        let values = resolve(target, &source).unwrap();
        prop_assert_eq!(values.len(), target.parameters.len());
        for (k, p) in &target.parameters {
            if p.consumed {
                prop_assert_eq!(&values[k], &format!("from-{k}"));
            } else {
                prop_assert_eq!(&values[k], &p.value);
            }
        }
    }
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_scenario_single_stack() {
    let a = Stack::new("a").value("x", "1");

    let set = StackSet::new([a]).unwrap();
    assert_eq!(set.chain(&["a"]).unwrap().names(), vec!["a"]);
}

#[test]
fn test_scenario_consumed_from_required_parameter() {
    let a = Stack::new("a").value("p", "1");
    let b = Stack::new("b").value("q", "2").consumes("p").requires(&a);

    StackSet::new([a.clone(), b.clone()]).unwrap();

    let source = Instance::new("a1", "g", a).parameter("p", "1");
    let values = resolve(&b, &source).unwrap();
    assert_eq!(values["p"], "1");
    assert_eq!(values["q"], "2");
}

#[test]
fn test_scenario_conflicting_providers() {
    let a = Stack::new("a").value("p", "");
    let a2 = Stack::new("a2").value("p", "");
    let c = Stack::new("c").consumes("p").requires(&a).requires(&a2);

    let err = StackSet::new([a, a2, c]).unwrap_err();
    assert!(matches!(
        err.violations(),
        [StackError::ConflictingProviders { stack, parameter, .. }]
            if stack == "c" && parameter == "p"
    ));
}

#[test]
fn test_scenario_mutual_requirement() {
    let d0 = Stack::new("d");
    let e = Stack::new("e").requires(&d0);
    let d = Stack::new("d").requires(&e);

    let err = StackSet::new([d, e]).unwrap_err();
    assert!(err
        .violations()
        .iter()
        .any(|v| matches!(v, StackError::CycleDetected { .. })));
}

#[test]
fn test_scenario_unmet_dependency() {
    let f = Stack::new("f").consumes("q");

    let err = StackSet::new([f]).unwrap_err();
    assert!(matches!(
        err.violations(),
        [StackError::UnmetDependency { stack, parameter }] if stack == "f" && parameter == "q"
    ));
    assert_eq!(err.to_string(), r#"no provider for stack "f" parameter "q""#);
}

// =============================================================================
// Diagrams
// =============================================================================

#[test]
fn test_builtin_d2_diagram() {
    let set = Catalog::builtin().validate().unwrap();
    insta::assert_snapshot!(set.graph().to_d2(), @r###"
    dhis2-core -> dhis2-db
    pgadmin -> dhis2-db
    dhis2
    dhis2-core
    pgadmin
    whoami-go
    "###);
}

#[test]
fn test_builtin_dot_diagram() {
    let set = Catalog::builtin().validate().unwrap();
    insta::assert_snapshot!(set.graph().to_dot(), @r###"
    digraph stacks {
      rankdir=LR;
      node [shape=box, style=rounded];

      "dhis2";
      "dhis2-core";
      "dhis2-db";
      "pgadmin";
      "whoami-go";

      "dhis2-db" -> "dhis2-core";
      "dhis2-db" -> "pgadmin";
    }
    "###);
}
