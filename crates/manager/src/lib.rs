// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! `cachemgrd`: the manager binary's library half.
//!
//! Ties `cachemgr-core`'s pure domain model and `cachemgr-wire`'s wire
//! formats to the concrete I/O this process owns: a worker child process, a
//! Unix admin socket, and a compiler. See [`actor`] for how the pieces are
//! assembled into one event loop.

pub mod actor;
pub mod compiler;
pub mod error;
pub mod listener;
pub mod manager;
pub mod settings;
pub mod worker;

pub use compiler::{Compiler, Source};
pub use error::{CompilerError, LifecycleError, WorkerError};
pub use manager::ManagerState;
pub use settings::Settings;
pub use worker::{ChildTransport, WorkerClient, WorkerTransport};
