// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The admin control listener (§6): accepts Unix socket connections and
//! speaks the line-oriented admin protocol - one line in, one line out -
//! for as many commands as a client cares to send over one connection.

use std::path::Path;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info};

use cachemgr_wire::admin::{parse_line, ParseError};
use cachemgr_wire::AdminResponse;

use crate::actor::Handle;
use crate::error::LifecycleError;

pub struct Listener {
    socket: UnixListener,
    actor: Handle,
}

impl Listener {
    /// Bind the admin socket at `path`, creating its parent directory and
    /// removing any stale socket file left behind by a previous process.
    pub fn bind(path: &Path, actor: Handle) -> Result<Self, LifecycleError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| LifecycleError::BindFailed(path.to_path_buf(), e))?;
        }
        let _ = std::fs::remove_file(path);
        let socket = UnixListener::bind(path).map_err(|e| LifecycleError::BindFailed(path.to_path_buf(), e))?;
        info!(path = %path.display(), "admin socket bound");
        Ok(Self { socket, actor })
    }

    /// Accept connections forever, handling each on its own task. Returns
    /// only if accepting itself fails unrecoverably, which does not happen
    /// for a Unix socket in practice.
    pub async fn run(self) {
        loop {
            match self.socket.accept().await {
                Ok((stream, _)) => {
                    let actor = self.actor.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, actor).await {
                            debug!(error = %e, "admin connection ended");
                        }
                    });
                }
                Err(e) => error!(error = %e, "admin accept error"),
            }
        }
    }
}

async fn handle_connection(stream: UnixStream, actor: Handle) -> Result<(), std::io::Error> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = match parse_line(&line) {
            Ok(request) => actor.dispatch(request).await,
            Err(e) => AdminResponse::new(parse_error_status(&e), e.to_string()),
        };
        writer.write_all(response.format_line().as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}

fn parse_error_status(_: &ParseError) -> u32 {
    cachemgr_core::Status::Param.code()
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
