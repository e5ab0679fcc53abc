// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cachemgr_core::Intent;

#[tokio::test]
async fn no_transport_elides_every_call() {
    let mut client = WorkerClient::none();
    assert!(!client.is_attached());
    client.load("A", "/tmp/a.so", true, Intent::Auto).await.unwrap();
    client.state("A", false, Intent::Auto).await.unwrap();
    client.use_config("A").await.unwrap();
    assert_eq!(client.list().await.unwrap(), None);
}

#[tokio::test]
async fn load_succeeds_on_default_200_reply() {
    let mut client = WorkerClient::new(Some(Box::new(ScriptedWorkerTransport::new())));
    client.load("A", "/tmp/a.so", true, Intent::Auto).await.unwrap();
}

#[tokio::test]
async fn rejection_propagates_status_and_body() {
    let mut transport = ScriptedWorkerTransport::new();
    transport.push_rejection(106, "bad state");
    let mut client = WorkerClient::new(Some(Box::new(transport)));
    let err = client.state("A", true, Intent::Auto).await.unwrap_err();
    assert_eq!(err.status().code(), 106);
    assert_eq!(err.body(), "bad state");
}

#[tokio::test]
async fn discard_swallows_rejection() {
    let mut transport = ScriptedWorkerTransport::new();
    transport.push_rejection(108, "child is crashing");
    let mut client = WorkerClient::new(Some(Box::new(transport)));
    client.discard("A").await; // must not panic or propagate
}

#[tokio::test]
async fn list_returns_worker_body_verbatim() {
    let mut transport = ScriptedWorkerTransport::new();
    transport.push_reply(200, "active warm/warm  A");
    let mut client = WorkerClient::new(Some(Box::new(transport)));
    assert_eq!(client.list().await.unwrap(), Some("active warm/warm  A".to_string()));
}
