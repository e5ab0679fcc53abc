// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Program`: a named, compiled configuration owned by the manager.
//!
//! Named `Program` rather than `Config` to avoid colliding with this
//! workspace's bootstrap `Settings` (see crate docs); every invariant below
//! applies to what the rest of the system calls a "config".

use smol_str::SmolStr;
use std::path::PathBuf;
use std::time::Instant;

/// Operator-expressed desire for a program's temperature.
///
/// `Label` is assigned only at creation and is immutable thereafter: a
/// label never transitions to `Auto`/`Warm`/`Cold` and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Auto,
    Warm,
    Cold,
    Label,
}

crate::simple_display! {
    Intent {
        Auto => "auto",
        Warm => "warm",
        Cold => "cold",
        Label => "label",
    }
}

impl Intent {
    /// Parse an administrative `state` literal (`auto`/`cold`/`warm`). Does
    /// not accept `label`: a label can only be created via `vcl.label`.
    pub fn parse_requested(s: &str) -> Option<Requested> {
        match s {
            "auto" => Some(Requested::Auto),
            "cold" => Some(Requested::Cold),
            "warm" => Some(Requested::Warm),
            _ => None,
        }
    }
}

/// The three states an administrative `vcl.state` call can request. A
/// separate type from [`Intent`] because `label` is never a valid request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requested {
    Auto,
    Warm,
    Cold,
}

crate::simple_display! {
    Requested {
        Auto => "auto",
        Warm => "warm",
        Cold => "cold",
    }
}

/// A named configuration program, plus its label adornment if any.
///
/// Invariants enforced by [`crate::registry::Registry`] and
/// [`crate::engine`], not by this struct's constructors alone:
/// - a config with `label_target.is_some()`, or which is the registry's
///   active program, always has `warm == true`
/// - `go_cold_at.is_some()` implies `intent == Intent::Auto`
#[derive(Debug, Clone)]
pub struct Program {
    name: SmolStr,
    artifact_path: Option<PathBuf>,
    intent: Intent,
    warm: bool,
    go_cold_at: Option<Instant>,
    /// For a label: the config it points at. For a non-label: the label
    /// that points at it, if any. Never both directions on the same field
    /// since a label's `label_target` is never another label.
    label_target: Option<SmolStr>,
    /// Names this program depends on (label target, or compiler-declared
    /// includes). Owned outgoing edge list, see [`crate::graph`].
    outgoing: Vec<SmolStr>,
    /// Names of programs that depend on this one. Maintained alongside
    /// `outgoing` by [`crate::graph`]; never touched directly.
    incoming: Vec<SmolStr>,
}

impl Program {
    pub(crate) fn new(name: SmolStr, intent: Intent) -> Self {
        Self {
            warm: intent != Intent::Cold,
            name,
            intent,
            artifact_path: None,
            go_cold_at: None,
            label_target: None,
            outgoing: Vec::new(),
            incoming: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn artifact_path(&self) -> Option<&std::path::Path> {
        self.artifact_path.as_deref()
    }

    pub fn set_artifact_path(&mut self, path: PathBuf) {
        self.artifact_path = Some(path);
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    pub(crate) fn set_intent(&mut self, intent: Intent) {
        self.intent = intent;
    }

    pub fn warm(&self) -> bool {
        self.warm
    }

    pub(crate) fn set_warm(&mut self, warm: bool) {
        self.warm = warm;
    }

    pub fn go_cold_at(&self) -> Option<Instant> {
        self.go_cold_at
    }

    pub(crate) fn set_go_cold_at(&mut self, at: Option<Instant>) {
        self.go_cold_at = at;
    }

    pub fn label_target(&self) -> Option<&str> {
        self.label_target.as_deref()
    }

    pub(crate) fn set_label_target(&mut self, target: Option<SmolStr>) {
        self.label_target = target;
    }

    pub fn is_label(&self) -> bool {
        self.intent == Intent::Label
    }

    /// Must stay warm: either the registry's active program, or something a
    /// label points at (invariant 3 of the data model).
    pub fn must_stay_warm(&self, is_active: bool) -> bool {
        is_active || self.label_target.is_some()
    }

    pub fn outgoing(&self) -> &[SmolStr] {
        &self.outgoing
    }

    pub fn incoming(&self) -> &[SmolStr] {
        &self.incoming
    }

    pub(crate) fn outgoing_mut(&mut self) -> &mut Vec<SmolStr> {
        &mut self.outgoing
    }

    pub(crate) fn incoming_mut(&mut self) -> &mut Vec<SmolStr> {
        &mut self.incoming
    }

    pub fn has_incoming(&self) -> bool {
        !self.incoming.is_empty()
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct ProgramBuilder => ProgramTestSeed {
        into { name: String = "test" }
        set { intent: Intent = Intent::Auto }
    }
}

#[cfg(any(test, feature = "test-support"))]
/// Seed values used to construct a [`Program`] directly in tests, bypassing
/// `Registry::add`'s uniqueness/active-promotion bookkeeping.
pub struct ProgramTestSeed {
    pub name: String,
    pub intent: Intent,
}

#[cfg(any(test, feature = "test-support"))]
impl ProgramTestSeed {
    pub fn into_program(self) -> Program {
        Program::new(SmolStr::new(self.name), self.intent)
    }
}
