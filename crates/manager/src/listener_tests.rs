// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use tempfile::tempdir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

use cachemgr_core::FakeClock;

use super::*;
use crate::compiler::StubCompiler;
use crate::manager::ManagerState;
use crate::worker::ScriptedWorkerTransport;

fn spawned_handle(artifact_root: std::path::PathBuf) -> crate::actor::Handle {
    let mut state = ManagerState::new(Box::new(StubCompiler::new()), artifact_root, Duration::from_secs(60), FakeClock::new());
    state.attach_worker(Box::new(ScriptedWorkerTransport::new()));
    crate::actor::spawn(state)
}

#[tokio::test]
async fn round_trips_a_load_and_list_over_the_socket() {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("admin.sock");
    let handle = spawned_handle(dir.path().join("artifacts"));

    let listener = Listener::bind(&socket_path, handle).unwrap();
    tokio::spawn(listener.run());

    let client = UnixStream::connect(&socket_path).await.unwrap();
    let (read_half, mut write_half) = client.into_split();
    let mut lines = BufReader::new(read_half).lines();

    write_half.write_all(b"vcl.load A /tmp/a.vcl\n").await.unwrap();
    assert_eq!(lines.next_line().await.unwrap().unwrap(), "200 ");

    write_half.write_all(b"vcl.list\n").await.unwrap();
    let listed = lines.next_line().await.unwrap().unwrap();
    assert!(listed.contains('A'));
}

#[tokio::test]
async fn unknown_command_gets_a_param_status() {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("admin.sock");
    let handle = spawned_handle(dir.path().join("artifacts"));

    let listener = Listener::bind(&socket_path, handle).unwrap();
    tokio::spawn(listener.run());

    let client = UnixStream::connect(&socket_path).await.unwrap();
    let (read_half, mut write_half) = client.into_split();
    let mut lines = BufReader::new(read_half).lines();

    write_half.write_all(b"vcl.bogus\n").await.unwrap();
    let reply = lines.next_line().await.unwrap().unwrap();
    assert!(reply.starts_with("106 "));
}

#[tokio::test]
async fn blank_lines_between_commands_are_ignored() {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("admin.sock");
    let handle = spawned_handle(dir.path().join("artifacts"));

    let listener = Listener::bind(&socket_path, handle).unwrap();
    tokio::spawn(listener.run());

    let client = UnixStream::connect(&socket_path).await.unwrap();
    let (read_half, mut write_half) = client.into_split();
    let mut lines = BufReader::new(read_half).lines();

    write_half.write_all(b"\nvcl.list\n").await.unwrap();
    let reply = lines.next_line().await.unwrap().unwrap();
    assert_eq!(reply, "200 ");
}
