// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A scripted [`WorkerTransport`] test double: records every line it
//! receives and replies from a queue of canned [`WorkerReply`]s, or `200
//! ""` if the queue is empty. Used by the manager's unit/integration tests
//! to assert exact RPC sequences (§8 end-to-end scenarios) without a real
//! worker process.

use async_trait::async_trait;
use cachemgr_wire::WorkerReply;
use std::collections::VecDeque;

use crate::error::WorkerError;
use crate::worker::WorkerTransport;

#[derive(Default)]
pub struct ScriptedWorkerTransport {
    sent: Vec<String>,
    replies: VecDeque<WorkerReply>,
}

impl ScriptedWorkerTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for the next call; replies are consumed in order.
    pub fn push_reply(&mut self, status: u32, body: impl Into<String>) {
        self.replies.push_back(WorkerReply { status, body: body.into() });
    }

    /// Queue a rejection (§4.D `CLIS_PARAM`/`CLIS_CANT`/opaque) for the next call.
    pub fn push_rejection(&mut self, status: u32, body: impl Into<String>) {
        self.push_reply(status, body);
    }

    /// Every line sent so far, in order.
    pub fn sent(&self) -> &[String] {
        &self.sent
    }
}

#[async_trait]
impl WorkerTransport for ScriptedWorkerTransport {
    async fn call(&mut self, line: &str) -> Result<WorkerReply, WorkerError> {
        self.sent.push(line.to_string());
        Ok(self.replies.pop_front().unwrap_or(WorkerReply { status: 200, body: String::new() }))
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
