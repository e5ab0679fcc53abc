// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `cachemgrd`: the configuration lifecycle manager binary.
//!
//! Wires the bootstrap [`Settings`], an optional worker child process, the
//! actor described in [`cachemgr_manager::actor`], the cooldown poker, and
//! the admin socket listener together, then blocks forever serving admin
//! connections (§5, §10).

use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cachemgr_core::SystemClock;
use cachemgr_manager::compiler::StubCompiler;
use cachemgr_manager::{actor, listener, ChildTransport, ManagerState, Settings};

fn init_logging(settings: &Settings) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    match &settings.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "cachemgrd.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt().with_env_filter(filter).with_writer(writer).init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load()?;
    let _log_guard = init_logging(&settings);

    let mut state = ManagerState::new(Box::new(StubCompiler::new()), settings.artifact_root.clone(), settings.cooldown_window, SystemClock);

    if let Some((name, path)) = &settings.boot_config {
        state.load(name, &path.display().to_string(), "auto").await?;
        info!(name, "boot config loaded");
    }

    if let Some(command) = &settings.worker_command {
        let transport = ChildTransport::spawn(command, &settings.worker_args)?;
        state.attach_worker(Box::new(transport));
        if let Err(e) = state.startup().await {
            error!(error = %e, "worker startup sequence failed");
            return Err(Box::new(e));
        }
        info!("worker started");
    }

    let handle = actor::spawn(state);

    let poker_handle = handle.clone();
    let poker_period = settings.poker_period().max(Duration::from_millis(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poker_period);
        loop {
            ticker.tick().await;
            poker_handle.poke().await;
        }
    });

    let admin_listener = listener::Listener::bind(&settings.admin_socket_path, handle)?;
    info!(path = %settings.admin_socket_path.display(), "cachemgrd ready");
    admin_listener.run().await;

    Ok(())
}
