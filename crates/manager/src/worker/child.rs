// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The real [`WorkerTransport`]: a spawned worker process's stdin/stdout,
//! piped line-for-line (§6 "Worker RPC").

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use cachemgr_wire::WorkerReply;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::error::WorkerError;
use crate::worker::WorkerTransport;

/// Owns the spawned worker's handle plus its stdin/stdout halves. The
/// child is killed on drop (tokio's default), which is the manager's
/// worker-crash recovery story for this core: there isn't one (§4.D).
pub struct ChildTransport {
    #[allow(dead_code)] // kept alive for the duration of the transport
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

impl ChildTransport {
    /// Spawn `command` with `args`, wiring its stdin/stdout for the
    /// line-oriented worker protocol. Stderr is inherited so worker
    /// diagnostics reach the manager's own log stream.
    pub fn spawn(command: &Path, args: &[String]) -> Result<Self, std::io::Error> {
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| std::io::Error::other("worker child has no piped stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| std::io::Error::other("worker child has no piped stdout"))?;
        Ok(Self { child, stdin, lines: BufReader::new(stdout).lines() })
    }
}

#[async_trait]
impl WorkerTransport for ChildTransport {
    async fn call(&mut self, line: &str) -> Result<WorkerReply, WorkerError> {
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;

        let reply_line = self.lines.next_line().await?.ok_or(WorkerError::UnexpectedEof)?;
        Ok(cachemgr_wire::worker::parse_reply(&reply_line)?)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
