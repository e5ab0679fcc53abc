// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

/// Proptest strategies for core domain types, used to drive the quantified
/// invariants of the registry/engine (name uniqueness, active-implies-warm,
/// label symmetry, poker safety) across randomly generated command
/// sequences.
pub mod strategies {
    use crate::program::{Intent, Requested};
    use proptest::prelude::*;

    const NAMES: [&str; 3] = ["a", "b", "c"];
    const LABEL_NAMES: [&str; 2] = ["l1", "l2"];

    /// Program names: drawn from a small fixed pool, deliberately
    /// collidable so generated command sequences exercise duplicate-name
    /// rejection rather than drawing a fresh unique name every call.
    pub fn arb_name() -> impl Strategy<Value = String> {
        prop::sample::select(&NAMES[..]).prop_map(String::from)
    }

    /// A label name: its own small pool, distinct from `arb_name`'s, so
    /// labels and plain configs only ever collide with their own kind.
    pub fn arb_label_name() -> impl Strategy<Value = String> {
        prop::sample::select(&LABEL_NAMES[..]).prop_map(String::from)
    }

    pub fn arb_intent() -> impl Strategy<Value = Intent> {
        prop_oneof![Just(Intent::Auto), Just(Intent::Warm), Just(Intent::Cold)]
    }

    pub fn arb_requested() -> impl Strategy<Value = Requested> {
        prop_oneof![Just(Requested::Auto), Just(Requested::Warm), Just(Requested::Cold)]
    }
}
