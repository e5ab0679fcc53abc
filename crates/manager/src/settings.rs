// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bootstrap configuration for the manager binary (§12).
//!
//! Resolved from environment variables with documented defaults; there is
//! no on-disk config file format, matching the source system's "no
//! persisted state" (§6).

use std::path::PathBuf;
use std::time::Duration;

use crate::error::LifecycleError;

const DEFAULT_ADMIN_SOCKET: &str = "/var/run/cachemgrd/admin.sock";
const DEFAULT_ARTIFACT_ROOT: &str = "/var/lib/cachemgrd/vcl";
const DEFAULT_COOLDOWN_SECS: u64 = 600;

/// Bootstrap configuration: where the admin socket lives, where compiled
/// artifacts are written, how to spawn the worker, and the initial
/// cooldown window (§12).
#[derive(Debug, Clone)]
pub struct Settings {
    /// Path of the Unix socket the admin listener binds.
    pub admin_socket_path: PathBuf,
    /// Root directory under which each config gets its own artifact
    /// subdirectory (§3 "artifact_path", §5 "shared resources").
    pub artifact_root: PathBuf,
    /// Path to the worker executable. `None` means run without a worker
    /// (all RPCs elided, §4.D).
    pub worker_command: Option<PathBuf>,
    /// Extra arguments passed to the worker executable.
    pub worker_args: Vec<String>,
    /// Interval after which an idle `auto` config is demoted (§4.F).
    pub cooldown_window: Duration,
    /// Directory for rolling log files. `None` logs to stderr only.
    pub log_dir: Option<PathBuf>,
    /// The name and source path of a config to load before the worker is
    /// started, taking the place of the original's argv-supplied boot VCL
    /// (argv parsing is out of scope, §1; this is the bootstrap-by-env-var
    /// equivalent). `None` means the binary starts with an empty registry
    /// and relies entirely on admin commands to populate it.
    pub boot_config: Option<(String, PathBuf)>,
}

impl Settings {
    /// Resolve settings from the environment:
    /// - `CACHEMGR_ADMIN_SOCKET` (default `/var/run/cachemgrd/admin.sock`)
    /// - `CACHEMGR_ARTIFACT_ROOT` (default `/var/lib/cachemgrd/vcl`)
    /// - `CACHEMGR_WORKER_CMD` (default: no worker)
    /// - `CACHEMGR_WORKER_ARGS` (space-separated, default empty)
    /// - `CACHEMGR_COOLDOWN_SECS` (default `600`)
    /// - `CACHEMGR_LOG_DIR` (default: log to stderr)
    /// - `CACHEMGR_BOOT_NAME` / `CACHEMGR_BOOT_PATH` (default: no boot config;
    ///   either both are set or neither is)
    pub fn load() -> Result<Self, LifecycleError> {
        let cooldown_window = std::env::var("CACHEMGR_COOLDOWN_SECS")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|secs| *secs > 0.0)
            .map(Duration::from_secs_f64)
            .unwrap_or(Duration::from_secs(DEFAULT_COOLDOWN_SECS));

        let boot_config = match (std::env::var("CACHEMGR_BOOT_NAME").ok(), std::env::var("CACHEMGR_BOOT_PATH").ok()) {
            (Some(name), Some(path)) => Some((name, PathBuf::from(path))),
            _ => None,
        };

        Ok(Self {
            admin_socket_path: std::env::var("CACHEMGR_ADMIN_SOCKET")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_ADMIN_SOCKET)),
            artifact_root: std::env::var("CACHEMGR_ARTIFACT_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_ARTIFACT_ROOT)),
            worker_command: std::env::var("CACHEMGR_WORKER_CMD").ok().map(PathBuf::from),
            worker_args: std::env::var("CACHEMGR_WORKER_ARGS")
                .ok()
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            cooldown_window,
            log_dir: std::env::var("CACHEMGR_LOG_DIR").ok().map(PathBuf::from),
            boot_config,
        })
    }

    /// The cooldown poker's tick period: `0.45 * cooldown_window` (§4.F, §8).
    pub fn poker_period(&self) -> Duration {
        self.cooldown_window.mul_f64(0.45)
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
