// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The command dispatcher (§4.E) and lifecycle (§4.G): the one place that
//! owns a [`Registry`], a [`WorkerClient`], and a [`Compiler`] together and
//! translates administrative requests into graph/engine operations plus
//! worker RPCs.
//!
//! Everything here runs on the single actor task described in §5 - there is
//! no locking because `&mut ManagerState` is only ever held by that task.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cachemgr_core::{link_label, set_auto, set_intent, set_state, unlink_label, Clock, CommandError, Intent, Program, Registry, Requested, StateChange, SystemClock};
use smol_str::SmolStr;
use tracing::{debug, info, instrument, warn};

use crate::compiler::{Compiler, Source};
use crate::error::LifecycleError;
use crate::worker::{WorkerClient, WorkerTransport};

/// Owns the registry, the worker client, and the compiler for one manager
/// process. Constructed once at startup; every field is private so mutation
/// only happens through the methods below (§9 "avoid hidden globals").
///
/// Generic over the clock so tests can drive cooldown expiry with
/// [`cachemgr_core::FakeClock`] instead of wall-clock time.
pub struct ManagerState<C: Clock = SystemClock> {
    registry: Registry,
    worker: WorkerClient,
    compiler: Box<dyn Compiler>,
    artifact_root: PathBuf,
    cooldown_window: Duration,
    clock: C,
    /// The OS process that first constructed this manager. `shutdown`
    /// no-ops unless the calling process still matches (§4.G, guards
    /// against e.g. a forked helper re-running teardown).
    original_pid: u32,
}

impl<C: Clock> ManagerState<C> {
    pub fn new(compiler: Box<dyn Compiler>, artifact_root: PathBuf, cooldown_window: Duration, clock: C) -> Self {
        Self {
            registry: Registry::new(),
            worker: WorkerClient::none(),
            compiler,
            artifact_root,
            cooldown_window,
            clock,
            original_pid: std::process::id(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn attach_worker(&mut self, transport: Box<dyn WorkerTransport>) {
        self.worker.attach(transport);
    }

    pub fn worker_attached(&self) -> bool {
        self.worker.is_attached()
    }

    /// Test-only: narrow the attached worker transport to `T` to assert
    /// exact RPC sequences (§8).
    #[cfg(any(test, feature = "test-support"))]
    pub fn worker_transport_as<T: 'static>(&self) -> Option<&T> {
        self.worker.transport_as::<T>()
    }

    fn dest_dir(&self, name: &str) -> PathBuf {
        self.artifact_root.join(name)
    }

    async fn apply_state_change(&mut self, change: StateChange) -> Result<(), CommandError> {
        if let StateChange::Changed { rpc: Some(rpc), .. } = change {
            self.worker.state(&rpc.name, rpc.warm, rpc.intent).await?;
        }
        Ok(())
    }

    // ---- §4.E administrative commands -----------------------------------

    /// `vcl.load name path [state]` - compiles `path` and loads it warm
    /// (per `state`, default `auto`).
    #[instrument(skip(self, path))]
    pub async fn load(&mut self, name: &str, path: &str, state: &str) -> Result<String, CommandError> {
        self.new_config(name, Source::Path(PathBuf::from(path)), state).await
    }

    /// `vcl.inline name source [state]` - as `load`, but compiles source
    /// text directly instead of a path.
    #[instrument(skip(self, source))]
    pub async fn inline(&mut self, name: &str, source: &str, state: &str) -> Result<String, CommandError> {
        self.new_config(name, Source::Inline(source.to_string()), state).await
    }

    async fn new_config(&mut self, name: &str, source: Source, state: &str) -> Result<String, CommandError> {
        if name.is_empty() {
            return Err(CommandError::Invalid("VCL program name must not be empty".to_string()));
        }
        if self.registry.contains(name) {
            return Err(CommandError::Invalid(format!("Already a VCL program named {name}")));
        }
        let requested = parse_state_literal(state)?;
        let intent = requested_to_intent(requested);

        self.registry.add(name, intent)?;

        let dest_dir = self.dest_dir(name);
        let artifact = match self.compiler.compile(name, &source, &dest_dir).await {
            Ok(artifact) => artifact,
            Err(e) => {
                self.rollback_new(name);
                return Err(e.into());
            }
        };

        if let Some(program) = self.registry.find_mut(name) {
            program.set_artifact_path(artifact.clone());
        }

        let warm = self.registry.find(name).map(Program::warm).unwrap_or(false);
        let path = artifact.display().to_string();
        if let Err(e) = self.worker.load(name, &path, warm, intent).await {
            self.rollback_new(name);
            return Err(e);
        }

        info!(name, %path, warm, %intent, "config loaded");
        Ok(String::new())
    }

    /// Undo a tentatively-added config that never finished compiling or
    /// loading (§4.E, §7 category 2/3). The config may have become
    /// `active` only because the registry happened to be empty (invariant
    /// 2 does not yet apply to it); clear that pointer before removing it
    /// so `Registry::remove`'s "not active" precondition holds.
    fn rollback_new(&mut self, name: &str) {
        self.registry.unset_active_if(name);
        self.registry.remove(name);
    }

    /// `vcl.use name` - switches the active config.
    #[instrument(skip(self))]
    pub async fn use_config(&mut self, name: &str) -> Result<String, CommandError> {
        if self.registry.find(name).is_none() {
            return Err(CommandError::Invalid(format!("No configuration named {name} known.")));
        }
        if self.registry.is_active(name) {
            return Ok(String::new());
        }

        let now = self.clock.now();
        let warmed = set_state(&mut self.registry, now, self.cooldown_window, name, Requested::Warm)?;
        self.apply_state_change(warmed).await?;

        match self.worker.use_config(name).await {
            Err(e) => {
                // Worker rejected the swap: revert the config we just
                // warmed back to auto with a fresh cooldown deadline (§4.E).
                let reverted = set_auto(&mut self.registry, now, self.cooldown_window, name)?;
                let _ = self.apply_state_change(reverted).await;
                Err(e)
            }
            Ok(()) => {
                let previous = self.registry.active_name().map(SmolStr::new);
                self.registry.set_active(name);
                if let Some(previous) = previous.filter(|p| p.as_str() != name) {
                    let change = set_auto(&mut self.registry, now, self.cooldown_window, &previous)?;
                    self.apply_state_change(change).await?;
                }
                info!(name, "config now active");
                Ok(format!("VCL '{name}' now active"))
            }
        }
    }

    /// `vcl.state name (auto|cold|warm)`.
    #[instrument(skip(self))]
    pub async fn state(&mut self, name: &str, requested_literal: &str) -> Result<String, CommandError> {
        let program = self.registry.find(name).ok_or_else(|| CommandError::Invalid(format!("No configuration named {name} known.")))?;

        if program.is_label() {
            return Err(CommandError::Invalid("Labels are always warm".to_string()));
        }
        if program.label_target().is_some() && requested_literal == "cold" {
            return Err(CommandError::Cant("A labeled VCL cannot be set cold".to_string()));
        }
        if program.intent().to_string() == requested_literal {
            return Ok(String::new());
        }

        let now = self.clock.now();
        match requested_literal {
            "auto" => {
                let change = set_auto(&mut self.registry, now, self.cooldown_window, name)?;
                self.apply_state_change(change).await?;
            }
            "cold" => {
                if self.registry.is_active(name) {
                    return Err(CommandError::Invalid("Cannot set the active VCL cold.".to_string()));
                }
                set_intent(&mut self.registry, name, Intent::Auto)?;
                let change = set_state(&mut self.registry, now, self.cooldown_window, name, Requested::Cold)?;
                self.apply_state_change(change).await?;
            }
            "warm" => {
                let change = set_state(&mut self.registry, now, self.cooldown_window, name, Requested::Warm)?;
                self.apply_state_change(change).await?;
                set_intent(&mut self.registry, name, Intent::Warm)?;
            }
            _ => return Err(CommandError::Invalid("State must be one of auto, cold or warm.".to_string())),
        }
        Ok(String::new())
    }

    /// `vcl.discard name`.
    #[instrument(skip(self))]
    pub async fn discard(&mut self, name: &str) -> Result<String, CommandError> {
        let program = self.registry.find(name).ok_or_else(|| CommandError::Invalid(format!("No configuration named {name} known.")))?;

        if self.registry.is_active(name) {
            return Err(CommandError::Invalid("Cannot discard active VCL program".to_string()));
        }
        if program.has_incoming() {
            if !program.is_label() {
                if let Some(label) = program.label_target() {
                    return Err(CommandError::Invalid(format!("Cannot discard labeled (\"{label}\") VCL program.")));
                }
            }
            return Err(CommandError::Invalid(format!(
                "Cannot discard \"{name}\", other VCLs depend on it: {}",
                format_dependents(program.incoming())
            )));
        }

        let now = self.clock.now();
        if program.is_label() {
            if let Some(target) = program.label_target().map(SmolStr::new) {
                unlink_label(&mut self.registry, name, &target);
            }
        } else {
            let change = set_state(&mut self.registry, now, self.cooldown_window, name, Requested::Cold)?;
            self.apply_state_change(change).await?;
        }

        self.worker.discard(name).await;

        if let Some(removed) = self.registry.remove(name) {
            if let Some(path) = removed.artifact_path() {
                cleanup_artifact(path);
            }
        }
        info!(name, "config discarded");
        Ok(String::new())
    }

    /// `vcl.list` - the worker's rendering if one exists, else a local
    /// one-line-per-config summary (§4.E).
    #[instrument(skip(self))]
    pub async fn list(&mut self) -> Result<String, CommandError> {
        if let Some(body) = self.worker.list().await? {
            return Ok(body);
        }
        let mut lines = Vec::new();
        for program in self.registry.iter() {
            let active = if self.registry.is_active(program.name()) { "active" } else { "available" };
            let warm = if program.warm() { "warm" } else { "cold" };
            let mut line = format!("{active} {}/{warm}  {}", program.intent(), program.name());
            if let Some(other) = program.label_target() {
                let arrow = if program.is_label() { "->" } else { "<-" };
                line.push_str(&format!(" {arrow} {other}"));
            }
            lines.push(line);
        }
        Ok(lines.join("\n"))
    }

    /// `vcl.label label target`.
    #[instrument(skip(self))]
    pub async fn label(&mut self, label_name: &str, target_name: &str) -> Result<String, CommandError> {
        let target = self.registry.find(target_name).ok_or_else(|| CommandError::Invalid(format!("No configuration named {target_name} known.")))?;
        if target.is_label() {
            return Err(CommandError::Invalid("VCL labels cannot point to labels".to_string()));
        }
        if let Some(existing_label) = target.label_target() {
            return Err(CommandError::Invalid(format!("VCL already labeled (\"{existing_label}\")")));
        }

        if let Some(existing) = self.registry.find(label_name) {
            if !existing.is_label() {
                return Err(CommandError::Invalid(format!("{label_name} is not a label")));
            }
        } else if label_name.is_empty() {
            return Err(CommandError::Invalid("VCL label name must not be empty".to_string()));
        } else if label_name.contains('.') {
            return Err(CommandError::Invalid("VCL labels cannot contain '.'".to_string()));
        }

        // Drive the target warm (and off `Cold`) before linking: once linked,
        // `must_stay_warm` is unconditionally true for it, and `set_state`
        // only asserts that invariant rather than establishing it (§4.C).
        let now = self.clock.now();
        if self.registry.find(target_name).map(Program::intent) == Some(Intent::Cold) {
            set_intent(&mut self.registry, target_name, Intent::Auto)?;
        }
        let change = set_state(&mut self.registry, now, self.cooldown_window, target_name, Requested::Warm)?;
        self.apply_state_change(change).await?;

        if let Some(old_target) = self.registry.find(label_name).and_then(|l| l.label_target().map(SmolStr::new)) {
            unlink_label(&mut self.registry, label_name, &old_target);
        } else {
            self.registry.add(label_name, Intent::Label)?;
        }

        link_label(&mut self.registry, label_name, target_name);

        self.worker.label(label_name, target_name).await?;
        info!(label = label_name, target = target_name, "label bound");
        Ok(String::new())
    }

    // ---- §4.F cooldown poker ----------------------------------------------

    /// Re-evaluate every config under `Requested::Auto` (§4.F). Configs
    /// that are active, labeled, or not in `auto` intent are no-ops by
    /// construction of [`set_state`]'s resolution rules.
    pub async fn poke(&mut self) {
        let now = self.clock.now();
        let names: Vec<SmolStr> = self.registry.iter().map(|p| SmolStr::new(p.name())).collect();
        for name in names {
            debug!(%name, "poker tick");
            match set_state(&mut self.registry, now, self.cooldown_window, &name, Requested::Auto) {
                Ok(change) => {
                    if let Err(e) = self.apply_state_change(change).await {
                        warn!(%name, error = %e, "poker's worker RPC failed");
                    }
                }
                Err(e) => warn!(%name, error = %e, "poker could not resolve config"),
            }
        }
    }

    // ---- §4.G lifecycle ----------------------------------------------------

    /// Push every registered config to a freshly attached worker, then tell
    /// it to start serving traffic (§4.G). Aborts at the first worker
    /// rejection.
    pub async fn startup(&mut self) -> Result<(), LifecycleError> {
        let active = self.registry.active_name().map(SmolStr::new).ok_or(LifecycleError::NoActiveConfig)?;

        let now = self.clock.now();
        let warmed = set_state(&mut self.registry, now, self.cooldown_window, &active, Requested::Warm)
            .map_err(|e| LifecycleError::StartupRejected { status: e.status().code(), body: e.body() })?;
        debug_assert_eq!(warmed, StateChange::NoOp, "active config must already be warm at startup");

        let non_labels: Vec<(SmolStr, String, bool, Intent)> = self
            .registry
            .iter()
            .filter(|p| !p.is_label())
            .map(|p| {
                (
                    SmolStr::new(p.name()),
                    p.artifact_path().map(|path| path.display().to_string()).unwrap_or_default(),
                    p.warm(),
                    p.intent(),
                )
            })
            .collect();
        for (name, path, warm, intent) in non_labels {
            self.worker
                .load(&name, &path, warm, intent)
                .await
                .map_err(|e| LifecycleError::StartupRejected { status: e.status().code(), body: e.body() })?;
        }

        let labels: Vec<(SmolStr, SmolStr)> = self
            .registry
            .iter()
            .filter(|p| p.is_label())
            .filter_map(|p| p.label_target().map(|t| (SmolStr::new(p.name()), SmolStr::new(t))))
            .collect();
        for (label_name, target) in labels {
            self.worker
                .label(&label_name, &target)
                .await
                .map_err(|e| LifecycleError::StartupRejected { status: e.status().code(), body: e.body() })?;
        }

        self.worker
            .use_config(&active)
            .await
            .map_err(|e| LifecycleError::StartupRejected { status: e.status().code(), body: e.body() })?;
        self.worker.start().await.map_err(|e| LifecycleError::StartupRejected { status: e.status().code(), body: e.body() })?;

        info!(active = %active, "worker startup sequence complete");
        Ok(())
    }

    /// Destroy every registered config, unlinking its artifact file and
    /// best-effort removing its enclosing directory. No-op unless called
    /// from the OS process that constructed this manager (§4.G).
    pub fn shutdown(&mut self) {
        if std::process::id() != self.original_pid {
            return;
        }
        info!("manager shutting down, destroying all registered configs");

        let labels: Vec<SmolStr> = self.registry.iter().filter(|p| p.is_label()).map(|p| SmolStr::new(p.name())).collect();
        for label_name in labels {
            if let Some(target) = self.registry.find(&label_name).and_then(|p| p.label_target().map(SmolStr::new)) {
                unlink_label(&mut self.registry, &label_name, &target);
            }
        }
        if let Some(active) = self.registry.active_name().map(SmolStr::new) {
            self.registry.unset_active_if(&active);
        }

        let names: Vec<SmolStr> = self.registry.iter().map(|p| SmolStr::new(p.name())).collect();
        for name in names {
            if let Some(removed) = self.registry.remove(&name) {
                if let Some(path) = removed.artifact_path() {
                    cleanup_artifact(path);
                }
            }
        }
    }
}

fn requested_to_intent(requested: Requested) -> Intent {
    match requested {
        Requested::Auto => Intent::Auto,
        Requested::Warm => Intent::Warm,
        Requested::Cold => Intent::Cold,
    }
}

fn parse_state_literal(s: &str) -> Result<Requested, CommandError> {
    Intent::parse_requested(s).ok_or_else(|| CommandError::Invalid("State must be one of auto, cold or warm.".to_string()))
}

/// Up to five dependent names, then `"[...]"` if more remain (§4.E discard).
fn format_dependents(incoming: &[SmolStr]) -> String {
    const LIMIT: usize = 5;
    let mut parts: Vec<String> = incoming.iter().take(LIMIT).map(|s| s.to_string()).collect();
    if incoming.len() > LIMIT {
        parts.push("[...]".to_string());
    }
    parts.join(", ")
}

/// Best-effort artifact cleanup (§3, §5): unlink the file, then try to
/// remove its now-possibly-empty enclosing directory. `rmdir` failing
/// because unrelated files were dropped alongside the artifact (coverage
/// data, etc.) is expected and ignored.
fn cleanup_artifact(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "failed to unlink artifact");
    }
    if let Some(dir) = path.parent() {
        let _ = std::fs::remove_dir(dir);
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "invariants_proptest.rs"]
mod invariants_proptest;
