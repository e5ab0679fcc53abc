// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The dependency graph (§4.A): directed `from -> to` edges between
//! programs, for label targets and compiler-declared includes.
//!
//! No transitive closure is materialized and the graph is never traversed
//! for reachability, only for local "does anything point at me?" checks
//! (§4.A). Rather than intrusive list nodes with per-endpoint membership
//! pointers (the original's approach, see DESIGN.md), an edge is just a
//! name appearing in both endpoints' owned lists on [`Program`](crate::program::Program).

use crate::registry::Registry;

/// Insert an edge `from -> to`: `to` is appended to `from`'s outgoing list,
/// `from` is appended to `to`'s incoming list. Both endpoints must already
/// exist in `registry`; a missing endpoint is a caller bug (asserted in
/// debug builds) rather than something this function recovers from.
pub fn add_edge(registry: &mut Registry, from: &str, to: &str) {
    let target_exists = registry.find(to).is_some();
    debug_assert!(target_exists, "add_edge: target {to} must already exist");
    if !target_exists {
        return;
    }
    let to_name = smol_str::SmolStr::new(to);
    if let Some(from_program) = registry.find_mut(from) {
        from_program.outgoing_mut().push(to_name);
    }
    let from_name = smol_str::SmolStr::new(from);
    if let Some(to_program) = registry.find_mut(to) {
        to_program.incoming_mut().push(from_name);
    }
}

/// Remove the edge `from -> to`, detaching it from both endpoints' lists.
/// A no-op if the edge does not exist.
pub fn remove_edge(registry: &mut Registry, from: &str, to: &str) {
    if let Some(from_program) = registry.find_mut(from) {
        from_program.outgoing_mut().retain(|n| n != to);
    }
    if let Some(to_program) = registry.find_mut(to) {
        to_program.incoming_mut().retain(|n| n != from);
    }
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
