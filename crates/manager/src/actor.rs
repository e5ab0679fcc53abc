// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The manager's single event loop (§5): one Tokio task owns a
//! [`ManagerState`] outright and drains one `mpsc` channel fed by the admin
//! listener and the cooldown poker. No `Mutex`, no shared globals - every
//! command is handled to completion before the next one is read off the
//! channel, which is what makes each administrative command a transaction.

use tokio::sync::{mpsc, oneshot};

use cachemgr_core::Clock;
use cachemgr_wire::{AdminRequest, AdminResponse};

use crate::manager::ManagerState;

/// One unit of work for the actor: either an admin request awaiting a
/// reply, or a cooldown poker tick.
pub enum Command {
    Admin { request: AdminRequest, respond_to: oneshot::Sender<AdminResponse> },
    Poke,
}

/// A cheaply cloneable handle to the running actor. Listener connections
/// and the poker task each hold one.
#[derive(Clone)]
pub struct Handle {
    tx: mpsc::Sender<Command>,
}

impl Handle {
    /// Send `request` to the actor and wait for its response. If the actor
    /// has already shut down, synthesizes a `cant` response rather than
    /// panicking - the listener should still be able to tell its client
    /// something went wrong.
    pub async fn dispatch(&self, request: AdminRequest) -> AdminResponse {
        let (respond_to, rx) = oneshot::channel();
        if self.tx.send(Command::Admin { request, respond_to }).await.is_err() {
            return AdminResponse::new(cachemgr_core::Status::Cant.code(), "manager is shutting down".to_string());
        }
        rx.await.unwrap_or_else(|_| AdminResponse::new(cachemgr_core::Status::Cant.code(), "manager is shutting down".to_string()))
    }

    /// Nudge the actor to run one cooldown-poker pass. Best-effort: dropped
    /// silently if the actor's channel is full or already closed, since
    /// another tick will follow shortly.
    pub async fn poke(&self) {
        let _ = self.tx.send(Command::Poke).await;
    }
}

/// Spawn the actor task and return a [`Handle`] to it. The task runs until
/// every `Handle` (and the internal sender retained by the poker task) is
/// dropped, at which point it calls [`ManagerState::shutdown`].
pub fn spawn<C: Clock + 'static>(mut state: ManagerState<C>) -> Handle {
    let (tx, mut rx) = mpsc::channel(64);
    tokio::spawn(async move {
        while let Some(command) = rx.recv().await {
            match command {
                Command::Admin { request, respond_to } => {
                    let response = dispatch_one(&mut state, request).await;
                    let _ = respond_to.send(response);
                }
                Command::Poke => state.poke().await,
            }
        }
        state.shutdown();
    });
    Handle { tx }
}

async fn dispatch_one<C: Clock>(state: &mut ManagerState<C>, request: AdminRequest) -> AdminResponse {
    let result = match request {
        AdminRequest::Load { name, path, state: requested } => state.load(&name, &path, &requested).await,
        AdminRequest::Inline { name, source, state: requested } => state.inline(&name, &source, &requested).await,
        AdminRequest::Use { name } => state.use_config(&name).await,
        AdminRequest::State { name, requested } => state.state(&name, &requested).await,
        AdminRequest::Discard { name } => state.discard(&name).await,
        AdminRequest::List => state.list().await,
        AdminRequest::Label { label, target } => state.label(&label, &target).await,
    };
    match result {
        Ok(body) => AdminResponse::ok(body),
        Err(e) => AdminResponse::new(e.status().code(), e.body()),
    }
}

#[cfg(test)]
#[path = "actor_tests.rs"]
mod tests;
