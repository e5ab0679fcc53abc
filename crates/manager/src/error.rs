// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the transport and lifecycle seams (§11).
//!
//! Domain errors (`CommandError`, `Status`) live in `cachemgr-core`; this
//! module covers what that crate deliberately has no transport of its own
//! for - talking to a worker child process and standing the manager up.

use std::path::PathBuf;

use cachemgr_core::{CommandError, Status};
use thiserror::Error;

/// Transport-level failure talking to the worker child process. Distinct
/// from a worker *rejecting* a well-formed command, which is a successful
/// RPC carrying a non-success status and surfaces as
/// [`CommandError::WorkerRejected`] instead.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("worker process I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("worker closed its stdout before replying")]
    UnexpectedEof,

    #[error("malformed worker reply: {0}")]
    Malformed(#[from] cachemgr_wire::WorkerWireError),

    #[error("worker process has not been started")]
    NotRunning,
}

impl WorkerError {
    /// Map a transport failure down onto the domain error type so the
    /// dispatcher has one error type to reason about once it decides how
    /// to recover (§7 category 3/4).
    pub fn into_command_error(self) -> CommandError {
        CommandError::WorkerRejected { status: Status::Cant.code(), body: self.to_string() }
    }
}

/// Failures starting up or tearing down the manager (§6, §4.G).
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to bind admin socket at {0}: {1}")]
    BindFailed(PathBuf, #[source] std::io::Error),

    #[error("failed to create artifact root {0}: {1}")]
    ArtifactRootFailed(PathBuf, #[source] std::io::Error),

    #[error("failed to spawn worker: {0}")]
    WorkerSpawnFailed(#[source] std::io::Error),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error("worker rejected startup: {status} {body}")]
    StartupRejected { status: u32, body: String },

    #[error("no active config to warm at startup")]
    NoActiveConfig,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Compiler failure surfaced to the caller as diagnostics (§6, §7 category
/// 2). The compiler itself is out of scope; this is the narrow interface
/// the dispatcher depends on.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct CompilerError(pub String);

impl From<CompilerError> for CommandError {
    fn from(e: CompilerError) -> Self {
        CommandError::Compiler(e.0)
    }
}
