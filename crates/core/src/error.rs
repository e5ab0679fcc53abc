// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status codes and the typed error carried by administrative commands.

use thiserror::Error;

/// Coarse outcome classification for an administrative command, mirrored
/// onto the wire as a numeric status by `cachemgr-wire`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The command completed; the registry reflects the requested change.
    Ok,
    /// The request itself was malformed or violated an invariant
    /// (duplicate name, bad state literal, label containing `.`, ...).
    Param,
    /// The request was well-formed but cannot be honored given the current
    /// state (e.g. cooling a config a label points at).
    Cant,
    /// Relayed verbatim from the worker; the manager does not interpret it.
    Worker(u32),
}

impl Status {
    /// The numeric code used on the wire, for statuses this core assigns
    /// itself. `Worker` statuses carry their own code.
    pub fn code(self) -> u32 {
        match self {
            Status::Ok => 200,
            Status::Param => 106,
            Status::Cant => 108,
            Status::Worker(code) => code,
        }
    }
}

crate::simple_display! {
    Status {
        Ok => "ok",
        Param => "param",
        Cant => "cant",
        Worker(..) => "worker",
    }
}

/// Failure of an administrative command. Every variant carries the status
/// and human-readable body reported back to the caller; the registry is
/// left unchanged for every variant except [`CommandError::WorkerRejected`]
/// in `use`, which the dispatcher reverts explicitly (see the `manager`
/// crate's dispatcher docs).
///
/// This crate has no transport of its own (see crate docs): a worker
/// *rejecting* an RPC (a well-formed reply carrying a non-success status)
/// surfaces here as [`CommandError::WorkerRejected`]; transport-level
/// failures talking to the worker process are `cachemgr-manager`'s
/// `WorkerError` and are mapped down to this type at the dispatcher
/// boundary, not constructed here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Cant(String),

    #[error("compiler error: {0}")]
    Compiler(String),

    #[error("worker rejected: {body}")]
    WorkerRejected { status: u32, body: String },
}

impl CommandError {
    pub fn status(&self) -> Status {
        match self {
            CommandError::Invalid(_) => Status::Param,
            CommandError::Cant(_) => Status::Cant,
            CommandError::Compiler(_) => Status::Param,
            CommandError::WorkerRejected { status, .. } => Status::Worker(*status),
        }
    }

    pub fn body(&self) -> String {
        self.to_string()
    }
}
