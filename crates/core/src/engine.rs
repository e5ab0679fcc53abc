// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The state engine (§4.C): resolves an operator's `Requested` intent, plus
//! cooldown-window expiry, into an effective warm/cold boolean.
//!
//! Pure with respect to the dependency graph - label relations are
//! enforced by the dispatcher before `set_state` is ever called - and pure
//! with respect to the worker: this crate has no transport of its own (see
//! crate docs). `set_state` only ever *describes* the worker RPC a caller
//! with a live worker connection should issue; `cachemgr-manager` is the
//! one that actually performs it.

use std::time::{Duration, Instant};

use smol_str::SmolStr;

use crate::error::CommandError;
use crate::program::{Intent, Program, Requested};
use crate::registry::Registry;

/// What the worker should be told if it exists. Carries enough to format
/// `vcl.state <name> <0|1><intent>` (§4.D) without re-deriving it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerStateRpc {
    pub name: SmolStr,
    pub warm: bool,
    pub intent: Intent,
}

/// Outcome of [`set_state`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    /// Already in the requested (or resolved) state; nothing to do.
    NoOp,
    /// `warm` changed to the carried value. If `rpc` is `Some`, the caller
    /// should forward it to the worker (if one exists) - see the note
    /// above about updating `warm` *before* that call completes (§9).
    Changed { warm: bool, rpc: Option<WorkerStateRpc> },
}

impl StateChange {
    pub fn warm_after(&self) -> Option<bool> {
        match self {
            StateChange::NoOp => None,
            StateChange::Changed { warm, .. } => Some(*warm),
        }
    }
}

/// Resolve `requested` against `name`'s current state and mutate the
/// registry accordingly. Returns the resulting [`StateChange`] for the
/// caller to relay to the worker.
///
/// Resolution rules, in order (§4.C):
/// 1. A program that must stay warm (active, or pointed at by a label) is
///    always a no-op; `warm` is asserted true rather than silently false.
/// 2. `Requested::Auto` resolves against the cooldown deadline: past
///    `go_cold_at + cooldown_window` while still `intent == Auto` demotes
///    to cold.
/// 3. Otherwise the requested boolean is used directly.
/// 4. No change if the resolved boolean matches current `warm`.
/// 5. Otherwise `warm` flips; going cold clears `go_cold_at`.
pub fn set_state(
    registry: &mut Registry,
    now: Instant,
    cooldown_window: Duration,
    name: &str,
    requested: Requested,
) -> Result<StateChange, CommandError> {
    let is_active = registry.is_active(name);
    let program = registry
        .find_mut(name)
        .ok_or_else(|| CommandError::Invalid(format!("No configuration named {name} known.")))?;

    if program.must_stay_warm(is_active) {
        debug_assert!(program.warm(), "{name} must stay warm but warm() is false");
        return Ok(StateChange::NoOp);
    }

    let want_warm = resolve(program, now, cooldown_window, requested);

    if want_warm == program.warm() {
        return Ok(StateChange::NoOp);
    }

    program.set_warm(want_warm);
    if !want_warm {
        program.set_go_cold_at(None);
    }

    Ok(StateChange::Changed {
        warm: want_warm,
        rpc: Some(WorkerStateRpc {
            name: SmolStr::new(name),
            warm: want_warm,
            intent: program.intent(),
        }),
    })
}

/// Pin `name`'s intent to `Auto` and, unless it must stay warm, stamp a
/// fresh cooldown deadline before re-resolving its effective temperature.
///
/// Shared by the dispatcher's `vcl.state name auto` handling and by `use`'s
/// demotion of the outgoing active program and worker-rejection revert -
/// all three reduce to "this program is no longer pinned; start its
/// cooldown clock over and let the engine decide" (§4.E).
pub fn set_auto(
    registry: &mut Registry,
    now: Instant,
    cooldown_window: Duration,
    name: &str,
) -> Result<StateChange, CommandError> {
    let must_stay_warm = registry
        .find(name)
        .map(|p| p.must_stay_warm(registry.is_active(name)))
        .ok_or_else(|| CommandError::Invalid(format!("No configuration named {name} known.")))?;
    if let Some(program) = registry.find_mut(name) {
        program.set_intent(Intent::Auto);
        if !must_stay_warm {
            program.set_go_cold_at(Some(now));
        }
    }
    set_state(registry, now, cooldown_window, name, Requested::Auto)
}

/// Pin `name`'s intent directly, bypassing the state machine. Used once a
/// `set_state` call has already driven the effective temperature where the
/// caller wants it (§4.E `vcl.state name warm`, and promoting a label's
/// newly-linked target off `Cold`).
pub fn set_intent(registry: &mut Registry, name: &str, intent: Intent) -> Result<(), CommandError> {
    registry
        .find_mut(name)
        .map(|p| p.set_intent(intent))
        .ok_or_else(|| CommandError::Invalid(format!("No configuration named {name} known.")))
}

/// Link a label to its target: add the `label -> target` edge and set both
/// sides' `label_target` back-references (§4.E `vcl.label`).
///
/// The caller must have already driven `target` warm - linking sets
/// `target.label_target`, and [`Program::must_stay_warm`] requires `warm`
/// to already be `true` for that invariant to hold (§3 invariant 3);
/// `set_state` asserts this defensively.
pub fn link_label(registry: &mut Registry, label: &str, target: &str) {
    crate::graph::add_edge(registry, label, target);
    let label_name = SmolStr::new(label);
    let target_name = SmolStr::new(target);
    if let Some(l) = registry.find_mut(label) {
        l.set_label_target(Some(target_name));
        l.set_warm(true);
    }
    if let Some(t) = registry.find_mut(target) {
        t.set_label_target(Some(label_name));
    }
}

/// Sever a label binding: remove the `label -> target` edge and clear
/// `target`'s back-reference. The label itself is left dangling (its own
/// `label_target` still names the old target) - callers either immediately
/// overwrite it with [`link_label`] (relabel) or discard the label program
/// outright (§4.E `vcl.discard` on a label).
pub fn unlink_label(registry: &mut Registry, label: &str, target: &str) {
    crate::graph::remove_edge(registry, label, target);
    if let Some(t) = registry.find_mut(target) {
        t.set_label_target(None);
    }
}

fn resolve(program: &Program, now: Instant, cooldown_window: Duration, requested: Requested) -> bool {
    match requested {
        Requested::Warm => true,
        Requested::Cold => false,
        Requested::Auto => {
            let past_deadline = match program.go_cold_at() {
                Some(at) if program.intent() == Intent::Auto => now.checked_duration_since(at).map(|d| d >= cooldown_window).unwrap_or(false),
                _ => false,
            };
            if past_deadline {
                false
            } else {
                program.warm()
            }
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
