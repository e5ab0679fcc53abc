// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use cachemgr_core::FakeClock;
use cachemgr_wire::AdminRequest;
use tempfile::tempdir;

use super::*;
use crate::compiler::StubCompiler;
use crate::worker::ScriptedWorkerTransport;

fn new_state(dir: &std::path::Path) -> ManagerState<FakeClock> {
    let mut state = ManagerState::new(Box::new(StubCompiler::new()), dir.to_path_buf(), Duration::from_secs(60), FakeClock::new());
    state.attach_worker(Box::new(ScriptedWorkerTransport::new()));
    state
}

fn load(name: &str, path: &str) -> AdminRequest {
    AdminRequest::Load { name: name.to_string(), path: path.to_string(), state: "auto".to_string() }
}

#[tokio::test]
async fn load_then_list_round_trips_through_the_actor() {
    let dir = tempdir().unwrap();
    let handle = spawn(new_state(dir.path()));

    let loaded = handle.dispatch(load("A", "/tmp/a.vcl")).await;
    assert_eq!(loaded.status, 200);

    let listed = handle.dispatch(AdminRequest::List).await;
    assert_eq!(listed.status, 200);
    assert!(listed.body.contains('A'));
}

#[tokio::test]
async fn duplicate_load_is_rejected_without_touching_the_first() {
    let dir = tempdir().unwrap();
    let handle = spawn(new_state(dir.path()));

    handle.dispatch(load("A", "/tmp/a.vcl")).await;
    let second = handle.dispatch(load("A", "/tmp/a.vcl")).await;
    assert_eq!(second.status, 106);

    let listed = handle.dispatch(AdminRequest::List).await;
    assert_eq!(listed.body.matches('A').count(), 1);
}

#[tokio::test]
async fn poke_does_not_disturb_an_idle_actor() {
    let dir = tempdir().unwrap();
    let handle = spawn(new_state(dir.path()));
    handle.dispatch(load("A", "/tmp/a.vcl")).await;

    handle.poke().await;

    let listed = handle.dispatch(AdminRequest::List).await;
    assert_eq!(listed.status, 200);
    assert!(listed.body.contains('A'));
}

#[tokio::test]
async fn dropping_every_handle_shuts_the_actor_down_cleanly() {
    let dir = tempdir().unwrap();
    let handle = spawn(new_state(dir.path()));
    handle.dispatch(load("A", "/tmp/a.vcl")).await;
    drop(handle);
    // give the actor task a chance to observe the closed channel and run
    // ManagerState::shutdown before the temp dir is cleaned up.
    tokio::task::yield_now().await;
}
