// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cachemgr-wire: the two line-oriented text protocols the manager speaks.
//!
//! `admin` parses and formats the administrative control channel (§6 Admin
//! CLI); `worker` formats the commands the manager issues to a worker
//! process and parses its replies (§4.D). Neither module touches a socket
//! or a child process - that's `cachemgr-manager`'s job.

pub mod admin;
pub mod worker;

pub use admin::{AdminRequest, AdminResponse, ParseError};
pub use worker::{WorkerReply, WorkerWireError};
