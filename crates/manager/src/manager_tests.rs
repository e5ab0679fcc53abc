// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use cachemgr_core::FakeClock;
use tempfile::tempdir;
use yare::parameterized;

use super::*;
use crate::compiler::StubCompiler;
use crate::worker::ScriptedWorkerTransport;

/// `yare::parameterized` generates plain `#[test]` functions, so the
/// table-driven tests below need their own way to drive `ManagerState`'s
/// async methods instead of `#[tokio::test]`.
fn block_on<F: std::future::Future>(fut: F) -> F::Output {
    tokio::runtime::Runtime::new().unwrap().block_on(fut)
}

fn new_state(dir: &std::path::Path) -> ManagerState<FakeClock> {
    let mut state = ManagerState::new(Box::new(StubCompiler::new()), dir.to_path_buf(), Duration::from_secs(60), FakeClock::new());
    state.attach_worker(Box::new(ScriptedWorkerTransport::new()));
    state
}

#[tokio::test]
async fn load_rejects_duplicate_name() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());

    state.load("A", "/tmp/a.vcl", "auto").await.unwrap();
    let err = state.load("A", "/tmp/a.vcl", "auto").await.unwrap_err();

    assert_eq!(err.status().code(), 106);
    assert_eq!(state.registry().len(), 1);
}

#[tokio::test]
async fn load_rejects_empty_name() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());

    let err = state.load("", "/tmp/a.vcl", "auto").await.unwrap_err();

    assert_eq!(err.status().code(), 106);
    assert!(state.registry().is_empty());
}

#[tokio::test]
async fn load_rolls_back_on_compiler_failure() {
    let dir = tempdir().unwrap();
    let compiler = StubCompiler::new();
    compiler.fail_next("syntax error on line 3");
    let mut state = ManagerState::new(Box::new(compiler), dir.path().to_path_buf(), Duration::from_secs(60), FakeClock::new());
    state.attach_worker(Box::new(ScriptedWorkerTransport::new()));

    let err = state.load("A", "/tmp/a.vcl", "auto").await.unwrap_err();

    assert_eq!(err.status().code(), 106);
    assert!(state.registry().find("A").is_none());
    assert!(state.registry().is_empty());
}

#[tokio::test]
async fn load_rolls_back_on_worker_rejection() {
    let dir = tempdir().unwrap();
    let mut transport = ScriptedWorkerTransport::new();
    transport.push_rejection(108, "worker is crashing");
    let mut state = ManagerState::new(Box::new(StubCompiler::new()), dir.path().to_path_buf(), Duration::from_secs(60), FakeClock::new());
    state.attach_worker(Box::new(transport));

    let err = state.load("A", "/tmp/a.vcl", "auto").await.unwrap_err();

    assert_eq!(err.status().code(), 108);
    assert!(state.registry().find("A").is_none());
}

#[tokio::test]
async fn inline_loads_cold_when_requested() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());

    state.load("active", "/tmp/active.vcl", "auto").await.unwrap();
    state.inline("B", "vcl 4.1;", "cold").await.unwrap();

    let program = state.registry().find("B").unwrap();
    assert_eq!(program.intent(), Intent::Cold);
    assert!(!program.warm());
}

#[tokio::test]
async fn use_config_is_idempotent_for_already_active() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());
    state.load("A", "/tmp/a.vcl", "auto").await.unwrap();

    let body = state.use_config("A").await.unwrap();

    assert_eq!(body, "");
    assert!(state.registry().is_active("A"));
}

#[tokio::test]
async fn use_config_swaps_active_and_starts_previous_cooldown() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());
    state.load("A", "/tmp/a.vcl", "auto").await.unwrap();
    state.load("B", "/tmp/b.vcl", "auto").await.unwrap();

    state.use_config("B").await.unwrap();

    assert!(state.registry().is_active("B"));
    assert!(!state.registry().is_active("A"));
    // demoted to auto, but the cooldown clock only just started
    assert!(state.registry().find("A").unwrap().warm());
    assert!(state.registry().find("A").unwrap().go_cold_at().is_some());
}

#[tokio::test]
async fn poke_leaves_config_warm_inside_the_cooldown_window() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());
    state.load("A", "/tmp/a.vcl", "auto").await.unwrap();
    state.load("B", "/tmp/b.vcl", "auto").await.unwrap();
    state.use_config("B").await.unwrap();

    state.poke().await;

    assert!(state.registry().find("A").unwrap().warm());
}

#[tokio::test]
async fn poke_demotes_auto_config_once_cooldown_elapses() {
    let dir = tempdir().unwrap();
    let clock = FakeClock::new();
    let mut state = ManagerState::new(Box::new(StubCompiler::new()), dir.path().to_path_buf(), Duration::from_secs(60), clock.clone());
    state.attach_worker(Box::new(ScriptedWorkerTransport::new()));

    state.load("A", "/tmp/a.vcl", "auto").await.unwrap();
    state.load("B", "/tmp/b.vcl", "auto").await.unwrap();
    state.use_config("B").await.unwrap();

    clock.advance(Duration::from_secs(120));
    state.poke().await;

    assert!(!state.registry().find("A").unwrap().warm());
}

#[tokio::test]
async fn use_config_reverts_to_auto_on_worker_rejection() {
    let dir = tempdir().unwrap();
    let mut transport = ScriptedWorkerTransport::new();
    transport.push_reply(200, ""); // vcl.load A
    transport.push_reply(200, ""); // vcl.load B
    transport.push_rejection(108, "worker refused the swap"); // vcl.use B
    let mut state = ManagerState::new(Box::new(StubCompiler::new()), dir.path().to_path_buf(), Duration::from_secs(60), FakeClock::new());
    state.attach_worker(Box::new(transport));

    state.load("A", "/tmp/a.vcl", "auto").await.unwrap();
    state.load("B", "/tmp/b.vcl", "auto").await.unwrap();
    let err = state.use_config("B").await.unwrap_err();

    assert_eq!(err.status().code(), 108);
    assert!(state.registry().is_active("A"));
    assert_eq!(state.registry().find("B").unwrap().intent(), Intent::Auto);
}

#[tokio::test]
async fn state_is_noop_when_already_requested() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());
    state.load("A", "/tmp/a.vcl", "auto").await.unwrap();

    let body = state.state("A", "auto").await.unwrap();
    assert_eq!(body, "");
}

#[tokio::test]
async fn state_refuses_cold_for_active_config() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());
    state.load("A", "/tmp/a.vcl", "auto").await.unwrap();

    let err = state.state("A", "cold").await.unwrap_err();
    assert_eq!(err.status().code(), 106);
}

#[tokio::test]
async fn state_refuses_cold_for_labeled_target() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());
    state.load("active", "/tmp/active.vcl", "auto").await.unwrap();
    state.load("B", "/tmp/b.vcl", "auto").await.unwrap();
    state.label("lbl", "B").await.unwrap();

    let err = state.state("B", "cold").await.unwrap_err();
    assert_eq!(err.status().code(), 108);
}

#[tokio::test]
async fn state_refuses_any_state_for_label() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());
    state.load("active", "/tmp/active.vcl", "auto").await.unwrap();
    state.load("B", "/tmp/b.vcl", "auto").await.unwrap();
    state.label("lbl", "B").await.unwrap();

    let err = state.state("lbl", "warm").await.unwrap_err();
    assert_eq!(err.status().code(), 106);
}

#[tokio::test]
async fn discard_refuses_active_config() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());
    state.load("A", "/tmp/a.vcl", "auto").await.unwrap();

    let err = state.discard("A").await.unwrap_err();
    assert_eq!(err.status().code(), 106);
}

#[tokio::test]
async fn discard_refuses_labeled_target() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());
    state.load("active", "/tmp/active.vcl", "auto").await.unwrap();
    state.load("B", "/tmp/b.vcl", "auto").await.unwrap();
    state.label("lbl", "B").await.unwrap();

    let err = state.discard("B").await.unwrap_err();
    assert_eq!(err.status().code(), 106);
    assert!(err.body().contains("lbl"));
}

#[tokio::test]
async fn discard_severs_label_without_cooling_target() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());
    state.load("active", "/tmp/active.vcl", "auto").await.unwrap();
    state.load("B", "/tmp/b.vcl", "auto").await.unwrap();
    state.label("lbl", "B").await.unwrap();

    state.discard("lbl").await.unwrap();

    assert!(state.registry().find("lbl").is_none());
    let target = state.registry().find("B").unwrap();
    assert!(target.label_target().is_none());
    assert!(target.warm());
}

#[tokio::test]
async fn discard_drives_plain_config_cold_first_and_cleans_up_artifact() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());
    state.load("active", "/tmp/active.vcl", "auto").await.unwrap();
    state.load("B", "/tmp/b.vcl", "auto").await.unwrap();
    let artifact = state.registry().find("B").unwrap().artifact_path().unwrap().to_path_buf();
    assert!(artifact.exists());

    state.discard("B").await.unwrap();

    assert!(state.registry().find("B").is_none());
    assert!(!artifact.exists());
}

#[tokio::test]
async fn list_renders_local_summary_without_worker() {
    let dir = tempdir().unwrap();
    let mut state = ManagerState::new(Box::new(StubCompiler::new()), dir.path().to_path_buf(), Duration::from_secs(60), FakeClock::new());
    state.load("A", "/tmp/a.vcl", "auto").await.unwrap();

    let body = state.list().await.unwrap();
    assert!(body.contains("active"));
    assert!(body.contains('A'));
}

#[tokio::test]
async fn list_prefers_worker_rendering_when_attached() {
    let dir = tempdir().unwrap();
    let mut transport = ScriptedWorkerTransport::new();
    transport.push_reply(200, ""); // vcl.load A
    transport.push_reply(200, "active auto/warm  A (from worker)");
    let mut state = ManagerState::new(Box::new(StubCompiler::new()), dir.path().to_path_buf(), Duration::from_secs(60), FakeClock::new());
    state.attach_worker(Box::new(transport));
    state.load("A", "/tmp/a.vcl", "auto").await.unwrap();

    let body = state.list().await.unwrap();
    assert_eq!(body, "active auto/warm  A (from worker)");
}

#[tokio::test]
async fn label_creates_new_label_and_warms_cold_target() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());
    state.load("active", "/tmp/active.vcl", "auto").await.unwrap();
    state.inline("B", "vcl 4.1;", "cold").await.unwrap();
    assert!(!state.registry().find("B").unwrap().warm());

    state.label("lbl", "B").await.unwrap();

    let target = state.registry().find("B").unwrap();
    assert_eq!(target.intent(), Intent::Auto);
    assert!(target.warm());
    assert_eq!(target.label_target(), Some("lbl"));
    assert_eq!(state.registry().find("lbl").unwrap().label_target(), Some("B"));
}

#[tokio::test]
async fn label_relabel_severs_old_edge() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());
    state.load("active", "/tmp/active.vcl", "auto").await.unwrap();
    state.load("C", "/tmp/c.vcl", "auto").await.unwrap();
    state.load("D", "/tmp/d.vcl", "auto").await.unwrap();
    state.label("lbl", "C").await.unwrap();

    state.label("lbl", "D").await.unwrap();

    assert!(state.registry().find("C").unwrap().label_target().is_none());
    assert_eq!(state.registry().find("D").unwrap().label_target(), Some("lbl"));
    assert_eq!(state.registry().find("lbl").unwrap().label_target(), Some("D"));
}

#[tokio::test]
async fn label_refuses_target_that_is_a_label() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());
    state.load("active", "/tmp/active.vcl", "auto").await.unwrap();
    state.load("B", "/tmp/b.vcl", "auto").await.unwrap();
    state.label("lbl1", "B").await.unwrap();

    let err = state.label("lbl2", "lbl1").await.unwrap_err();
    assert_eq!(err.status().code(), 106);
}

#[tokio::test]
async fn label_refuses_target_already_labeled() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());
    state.load("active", "/tmp/active.vcl", "auto").await.unwrap();
    state.load("B", "/tmp/b.vcl", "auto").await.unwrap();
    state.label("lbl1", "B").await.unwrap();

    let err = state.label("lbl2", "B").await.unwrap_err();
    assert_eq!(err.status().code(), 106);
}

#[tokio::test]
async fn label_refuses_existing_name_that_is_not_a_label() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());
    state.load("active", "/tmp/active.vcl", "auto").await.unwrap();
    state.load("B", "/tmp/b.vcl", "auto").await.unwrap();

    let err = state.label("active", "B").await.unwrap_err();
    assert_eq!(err.status().code(), 106);
}

#[tokio::test]
async fn label_refuses_empty_name() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());
    state.load("active", "/tmp/active.vcl", "auto").await.unwrap();
    state.load("B", "/tmp/b.vcl", "auto").await.unwrap();

    let err = state.label("", "B").await.unwrap_err();
    assert_eq!(err.status().code(), 106);
}

#[tokio::test]
async fn label_refuses_new_name_with_dot() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());
    state.load("active", "/tmp/active.vcl", "auto").await.unwrap();
    state.load("B", "/tmp/b.vcl", "auto").await.unwrap();

    let err = state.label("my.lbl", "B").await.unwrap_err();
    assert_eq!(err.status().code(), 106);
}

#[tokio::test]
async fn startup_runs_full_sequence_for_active_config() {
    let dir = tempdir().unwrap();
    let mut state = ManagerState::new(Box::new(StubCompiler::new()), dir.path().to_path_buf(), Duration::from_secs(60), FakeClock::new());
    state.load("A", "/tmp/a.vcl", "auto").await.unwrap();
    state.load("B", "/tmp/b.vcl", "auto").await.unwrap();
    state.label("lbl", "B").await.unwrap();
    state.attach_worker(Box::new(ScriptedWorkerTransport::new()));

    state.startup().await.unwrap();
}

#[tokio::test]
async fn startup_sends_exactly_the_bootstrap_sequence() {
    let dir = tempdir().unwrap();
    let mut state = ManagerState::new(Box::new(StubCompiler::new()), dir.path().to_path_buf(), Duration::from_secs(60), FakeClock::new());
    state.load("A", "/tmp/a.vcl", "auto").await.unwrap();
    state.load("B", "/tmp/b.vcl", "auto").await.unwrap();
    state.attach_worker(Box::new(ScriptedWorkerTransport::new()));

    state.startup().await.unwrap();

    let path_a = state.registry().find("A").unwrap().artifact_path().unwrap().display().to_string();
    let path_b = state.registry().find("B").unwrap().artifact_path().unwrap().display().to_string();
    let sent = state.worker_transport_as::<ScriptedWorkerTransport>().unwrap().sent();
    assert_eq!(
        sent,
        [
            format!("vcl.load \"A\" {path_a} 1auto"),
            format!("vcl.load \"B\" {path_b} 1auto"),
            "vcl.use \"A\"".to_string(),
            "start".to_string(),
        ]
    );
}

#[tokio::test]
async fn startup_fails_without_active_config() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());

    let err = state.startup().await.unwrap_err();
    assert!(matches!(err, LifecycleError::NoActiveConfig));
}

#[tokio::test]
async fn shutdown_removes_everything_and_cleans_up_artifacts() {
    let dir = tempdir().unwrap();
    let mut state = new_state(dir.path());
    state.load("A", "/tmp/a.vcl", "auto").await.unwrap();
    state.load("B", "/tmp/b.vcl", "auto").await.unwrap();
    state.label("lbl", "B").await.unwrap();
    let artifact_a = state.registry().find("A").unwrap().artifact_path().unwrap().to_path_buf();

    state.shutdown();

    assert!(state.registry().is_empty());
    assert!(!artifact_a.exists());
}

#[parameterized(
    active_config_rejects_cold = { true, false, "cold", 106 },
    labeled_target_rejects_cold = { false, true, "cold", 108 },
    plain_config_accepts_warm = { false, false, "warm", 200 },
    plain_config_accepts_cold = { false, false, "cold", 200 },
)]
fn state_transition_gating(target_is_active: bool, target_is_labeled: bool, requested: &str, expected_status: u32) {
    block_on(async {
        let dir = tempdir().unwrap();
        let mut state = new_state(dir.path());
        state.load("active", "/tmp/active.vcl", "auto").await.unwrap();
        state.load("B", "/tmp/b.vcl", "auto").await.unwrap();
        if target_is_labeled {
            state.label("lbl", "B").await.unwrap();
        }
        let target = if target_is_active { "active" } else { "B" };

        let result = state.state(target, requested).await;

        if expected_status == 200 {
            assert!(result.is_ok(), "expected success, got {result:?}");
        } else {
            assert_eq!(result.unwrap_err().status().code(), expected_status);
        }
    });
}

#[parameterized(
    discard_active_config = { "active", false, false, 106, None },
    discard_labeled_target = { "B", false, true, 106, Some("lbl") },
    discard_with_generic_dependent = { "B", true, false, 106, None },
    discard_plain_config_succeeds = { "B", false, false, 200, None },
)]
fn discard_refusal_reasons(target: &str, add_dependent_edge: bool, add_label: bool, expected_status: u32, body_contains: Option<&str>) {
    block_on(async {
        let dir = tempdir().unwrap();
        let mut state = new_state(dir.path());
        state.load("active", "/tmp/active.vcl", "auto").await.unwrap();
        state.load("B", "/tmp/b.vcl", "auto").await.unwrap();
        if add_label {
            state.label("lbl", "B").await.unwrap();
        }
        if add_dependent_edge {
            state.load("dep", "/tmp/dep.vcl", "auto").await.unwrap();
            cachemgr_core::graph::add_edge(&mut state.registry, "dep", "B");
        }

        let result = state.discard(target).await;

        if expected_status == 200 {
            assert!(result.is_ok(), "expected success, got {result:?}");
        } else {
            let err = result.unwrap_err();
            assert_eq!(err.status().code(), expected_status);
            if let Some(needle) = body_contains {
                assert!(err.body().contains(needle));
            }
        }
    });
}
