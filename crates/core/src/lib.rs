// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cachemgr-core: the configuration lifecycle domain model.
//!
//! Owns the dependency graph, the config registry, and the pure state
//! engine that resolves an operator's intent into an effective warm/cold
//! temperature. Nothing here talks to a worker process or a socket; see
//! `cachemgr-wire` and `cachemgr-manager` for that.

pub mod macros;

pub mod clock;
pub mod engine;
pub mod error;
pub mod graph;
pub mod program;
pub mod registry;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use engine::{link_label, set_auto, set_intent, set_state, unlink_label, StateChange, WorkerStateRpc};
pub use error::{CommandError, Status};
pub use program::{Intent, Program, Requested};
pub use registry::Registry;
