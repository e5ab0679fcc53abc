// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests driving `ManagerState` through randomly generated command
//! sequences (§8, §13): name uniqueness, active-implies-warm, label
//! symmetry, and poker safety must hold after every step, not just in the
//! hand-picked scenarios in `manager_tests.rs`.

use std::collections::HashSet;

use cachemgr_core::test_support::strategies::{arb_intent, arb_label_name, arb_name, arb_requested};
use cachemgr_core::FakeClock;
use proptest::prelude::*;
use tempfile::tempdir;

use super::*;
use crate::compiler::StubCompiler;
use crate::worker::ScriptedWorkerTransport;

/// Sequences drawn from `arb_name`/`arb_label_name`'s small collidable
/// pools guarantee duplicate-load, discard-with-dependents, and relabeling
/// cases show up without needing a large `ProptestConfig::cases`.
#[derive(Debug, Clone)]
enum Op {
    Load { name: String, state: String },
    Use { name: String },
    SetState { name: String, requested: String },
    Discard { name: String },
    Label { label: String, target: String },
    Poke,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (arb_name(), arb_intent()).prop_map(|(name, intent)| Op::Load { name, state: intent.to_string() }),
        arb_name().prop_map(|name| Op::Use { name }),
        (arb_name(), arb_requested()).prop_map(|(name, requested)| Op::SetState { name, requested: requested.to_string() }),
        prop_oneof![arb_name(), arb_label_name()].prop_map(|name| Op::Discard { name }),
        (arb_label_name(), arb_name()).prop_map(|(label, target)| Op::Label { label, target }),
        Just(Op::Poke),
    ]
}

/// Every registered name appears at most once (backed by `IndexMap`, but
/// `ManagerState` never exposes a way to observe a collision either).
fn assert_name_uniqueness(state: &ManagerState<FakeClock>) {
    let mut seen = HashSet::new();
    for program in state.registry().iter() {
        assert!(seen.insert(program.name().to_string()), "duplicate name {} in registry", program.name());
    }
}

/// The active config, and anything a label currently points at, must be
/// warm (§3 invariant 3).
fn assert_active_implies_warm(state: &ManagerState<FakeClock>) {
    if let Some(active) = state.registry().active() {
        assert!(active.warm(), "active config {} is not warm", active.name());
    }
    for program in state.registry().iter() {
        if program.is_label() {
            if let Some(target) = program.label_target() {
                let target_program = state.registry().find(target).unwrap_or_else(|| panic!("label {} points at missing {target}", program.name()));
                assert!(target_program.warm(), "labeled target {target} is not warm");
            }
        }
    }
}

/// A label's `label_target` and its target's `label_target` always name
/// each other - never a dangling pointer, never a one-way edge.
fn assert_label_symmetry(state: &ManagerState<FakeClock>) {
    for program in state.registry().iter() {
        if program.is_label() {
            let target_name = program.label_target().unwrap_or_else(|| panic!("label {} has no target", program.name()));
            let target = state.registry().find(target_name).unwrap_or_else(|| panic!("label {} points at missing {target_name}", program.name()));
            assert_eq!(target.label_target(), Some(program.name()), "label {} <-> {target_name} edge is not symmetric", program.name());
        } else if let Some(pointing_label) = program.label_target() {
            let label = state
                .registry()
                .find(pointing_label)
                .unwrap_or_else(|| panic!("{} names label {pointing_label} that does not exist", program.name()));
            assert_eq!(label.label_target(), Some(program.name()), "{} <-> {pointing_label} edge is not symmetric", program.name());
        }
    }
}

/// `poke` only ever resolves `Requested::Auto` configs (§4.F): it must
/// never cool something that just became warm (active or labeled), and it
/// must never warm a config back up - cooling is monotonic per cooldown
/// window.
async fn assert_poker_safety(state: &mut ManagerState<FakeClock>) {
    let before: Vec<(String, bool)> = state.registry().iter().map(|p| (p.name().to_string(), p.warm())).collect();
    state.poke().await;
    for (name, was_warm) in before {
        let Some(program) = state.registry().find(&name) else { continue };
        let is_active_or_labeled = state.registry().is_active(&name) || program.label_target().is_some() && !program.is_label();
        if is_active_or_labeled {
            assert!(program.warm(), "poke cooled {name}, which must stay warm");
        }
        if !was_warm {
            assert!(!program.warm(), "poke warmed up {name}, which was already cold");
        }
    }
}

fn assert_all_invariants(state: &ManagerState<FakeClock>) {
    assert_name_uniqueness(state);
    assert_active_implies_warm(state);
    assert_label_symmetry(state);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn command_sequences_preserve_invariants(ops in prop::collection::vec(arb_op(), 1..24)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let dir = tempdir().unwrap();
            let mut state = ManagerState::new(Box::new(StubCompiler::new()), dir.path().to_path_buf(), std::time::Duration::from_secs(30), FakeClock::new());
            state.attach_worker(Box::new(ScriptedWorkerTransport::new()));

            for op in ops {
                match op {
                    Op::Load { name, state: initial_state } => {
                        let _ = state.load(&name, "/tmp/x.vcl", &initial_state).await;
                    }
                    Op::Use { name } => {
                        let _ = state.use_config(&name).await;
                    }
                    Op::SetState { name, requested } => {
                        let _ = state.state(&name, &requested).await;
                    }
                    Op::Discard { name } => {
                        let _ = state.discard(&name).await;
                    }
                    Op::Label { label, target } => {
                        let _ = state.label(&label, &target).await;
                    }
                    Op::Poke => {
                        assert_poker_safety(&mut state).await;
                    }
                }
                assert_all_invariants(&state);
            }
        });
    }
}
