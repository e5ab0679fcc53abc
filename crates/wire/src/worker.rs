// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker RPC wire format (§4.D): one command line out, one
//! `<status> <body>` reply line back.

use cachemgr_core::Intent;
use thiserror::Error;

/// `vcl.load "<name>" <artifact_path> <0|1><intent>`
pub fn load(name: &str, path: &str, warm: bool, intent: Intent) -> String {
    format!("vcl.load \"{name}\" {path} {}{intent}", warm as u8)
}

/// `vcl.state <name> <0|1><intent>`
pub fn state(name: &str, warm: bool, intent: Intent) -> String {
    format!("vcl.state {name} {}{intent}", warm as u8)
}

/// `vcl.use "<name>"`
pub fn use_config(name: &str) -> String {
    format!("vcl.use \"{name}\"")
}

/// `vcl.label <label> <target>`
pub fn label(label: &str, target: &str) -> String {
    format!("vcl.label {label} {target}")
}

/// `vcl.discard <name>`
pub fn discard(name: &str) -> String {
    format!("vcl.discard {name}")
}

/// `vcl.list`
pub const LIST: &str = "vcl.list";

/// `start` - worker begins serving traffic.
pub const START: &str = "start";

/// A worker's reply to one command: an unsigned status and a string body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReply {
    pub status: u32,
    pub body: String,
}

impl WorkerReply {
    /// Status `200` is the one success class this core recognizes (§6);
    /// everything else is relayed to the caller as a rejection.
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkerWireError {
    #[error("empty reply line")]
    Empty,
    #[error("malformed reply line: {0:?}")]
    Malformed(String),
}

/// Parse a `<status> <body>` reply line. `body` may be empty; embedded
/// `\n` escapes (written by [`crate::admin::AdminResponse::format_line`]
/// on the admin side, and mirrored here for symmetry) are left as-is -
/// callers relay the body verbatim rather than re-interpreting it.
pub fn parse_reply(line: &str) -> Result<WorkerReply, WorkerWireError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Err(WorkerWireError::Empty);
    }
    let (status_str, body) = line.split_once(' ').unwrap_or((line, ""));
    let status = status_str.parse::<u32>().map_err(|_| WorkerWireError::Malformed(line.to_string()))?;
    Ok(WorkerReply { status, body: body.to_string() })
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
