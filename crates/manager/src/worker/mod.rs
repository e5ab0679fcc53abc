// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker RPC client (§4.D): a single-writer, single-reader channel to
//! a worker process, built on the [`WorkerTransport`] trait so a real
//! `tokio::process::Child` and a scripted test double share one client.

mod child;
#[cfg(any(test, feature = "test-support"))]
mod scripted;

pub use child::ChildTransport;
#[cfg(any(test, feature = "test-support"))]
pub use scripted::ScriptedWorkerTransport;

use async_trait::async_trait;
use cachemgr_core::{CommandError, Intent};
use cachemgr_wire::WorkerReply;

use crate::error::WorkerError;

/// One round trip with a worker process: send a command line, read back a
/// `<status> <body>` reply line. Implementors own serialization - callers
/// never interleave two calls.
#[async_trait]
pub trait WorkerTransport: Send {
    async fn call(&mut self, line: &str) -> Result<WorkerReply, WorkerError>;

    /// Narrows back to the concrete implementation so tests can inspect a
    /// [`ScriptedWorkerTransport`] after it has been boxed into a
    /// [`WorkerClient`] (§8 end-to-end scenarios assert exact RPC
    /// sequences). Production transports have no use for this.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Wraps an optional [`WorkerTransport`] and formats the seven commands
/// this core issues (§4.D). `None` means no worker process exists: every
/// call is elided and treated as success, matching the original's
/// `child_pid < 0` short-circuit.
pub struct WorkerClient {
    transport: Option<Box<dyn WorkerTransport>>,
}

impl WorkerClient {
    pub fn new(transport: Option<Box<dyn WorkerTransport>>) -> Self {
        Self { transport }
    }

    pub fn none() -> Self {
        Self { transport: None }
    }

    pub fn attach(&mut self, transport: Box<dyn WorkerTransport>) {
        self.transport = Some(transport);
    }

    pub fn is_attached(&self) -> bool {
        self.transport.is_some()
    }

    /// The attached transport narrowed to `T`, if one is attached and its
    /// concrete type matches. Test-only: used to assert exact RPC sequences
    /// against a [`ScriptedWorkerTransport`] (§8).
    #[cfg(any(test, feature = "test-support"))]
    pub fn transport_as<T: 'static>(&self) -> Option<&T> {
        self.transport.as_deref().and_then(|t| t.as_any().downcast_ref::<T>())
    }

    async fn call(&mut self, line: String) -> Result<(), CommandError> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(());
        };
        let reply = transport.call(&line).await.map_err(WorkerError::into_command_error)?;
        if reply.is_success() {
            Ok(())
        } else {
            Err(CommandError::WorkerRejected { status: reply.status, body: reply.body })
        }
    }

    pub async fn load(&mut self, name: &str, path: &str, warm: bool, intent: Intent) -> Result<(), CommandError> {
        self.call(cachemgr_wire::worker::load(name, path, warm, intent)).await
    }

    pub async fn state(&mut self, name: &str, warm: bool, intent: Intent) -> Result<(), CommandError> {
        self.call(cachemgr_wire::worker::state(name, warm, intent)).await
    }

    pub async fn use_config(&mut self, name: &str) -> Result<(), CommandError> {
        self.call(cachemgr_wire::worker::use_config(name)).await
    }

    pub async fn label(&mut self, label: &str, target: &str) -> Result<(), CommandError> {
        self.call(cachemgr_wire::worker::label(label, target)).await
    }

    /// Unlike the other calls, a worker crash/rejection here is logged and
    /// swallowed, not propagated: the manager proceeds to remove the config
    /// locally regardless (§4.E discard, §7 category 4).
    pub async fn discard(&mut self, name: &str) {
        if let Err(e) = self.call(cachemgr_wire::worker::discard(name)).await {
            tracing::warn!(name, error = %e, "worker rejected vcl.discard; proceeding with local removal");
        }
    }

    pub async fn list(&mut self) -> Result<Option<String>, CommandError> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(None);
        };
        let reply = transport.call(cachemgr_wire::worker::LIST).await.map_err(WorkerError::into_command_error)?;
        if reply.is_success() {
            Ok(Some(reply.body))
        } else {
            Err(CommandError::WorkerRejected { status: reply.status, body: reply.body })
        }
    }

    pub async fn start(&mut self) -> Result<(), CommandError> {
        self.call(cachemgr_wire::worker::START.to_string()).await
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
