// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The config registry (§4.B): the set of known programs, keyed by unique
//! name, in insertion order, with one distinguished `active` pointer.

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::error::CommandError;
use crate::program::{Intent, Program};

/// Ordered set of [`Program`]s plus the `active` pointer.
///
/// Insertion order is preserved (`IndexMap`) because `list()` renders
/// programs in the order they were created, matching the original
/// intrusive-list behavior (§9 design notes).
#[derive(Debug, Default)]
pub struct Registry {
    programs: IndexMap<SmolStr, Program>,
    active: Option<SmolStr>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a program with the requested intent. Promotes it to `active`
    /// iff the registry was previously empty. Fails if `name` is already
    /// taken.
    pub fn add(&mut self, name: impl Into<SmolStr>, intent: Intent) -> Result<&mut Program, CommandError> {
        let name = name.into();
        if self.programs.contains_key(&name) {
            return Err(CommandError::Invalid(format!("Already a VCL program named {name}")));
        }
        let became_active = self.active.is_none();
        if became_active {
            self.active = Some(name.clone());
        }
        let new_program = Program::new(name.clone(), intent);
        let displaced = self.programs.insert(name.clone(), new_program);
        debug_assert!(displaced.is_none(), "name {name} was just checked absent");
        self.programs
            .get_mut(&name)
            .ok_or_else(|| CommandError::Invalid(format!("failed to insert VCL program {name}")))
    }

    pub fn find(&self, name: &str) -> Option<&Program> {
        self.programs.get(name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Program> {
        self.programs.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.programs.contains_key(name)
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn active(&self) -> Option<&Program> {
        self.active.as_deref().and_then(|n| self.programs.get(n))
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.as_deref() == Some(name)
    }

    /// Swap the active program. The caller is responsible for having
    /// already warmed `name` and cooled-eligible the previous active
    /// program (§4.E `use`); the registry only tracks the pointer.
    pub fn set_active(&mut self, name: impl Into<SmolStr>) {
        self.active = Some(name.into());
    }

    /// In insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Program> {
        self.programs.values()
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Clear the `active` pointer if it currently names `name`.
    ///
    /// Used only to roll back a tentative `load`/`inline` that never
    /// finished (compiler or worker rejection): such a program is `active`
    /// only because the registry happened to be empty when it was added,
    /// and invariant 2 ("active is non-null after the first *successful*
    /// load") does not yet apply to it.
    pub fn unset_active_if(&mut self, name: &str) {
        if self.is_active(name) {
            self.active = None;
        }
    }

    /// Remove a program from the registry, unlinking its outgoing edges.
    ///
    /// By contract the caller (the dispatcher, §4.E) must already have
    /// verified the program has no incoming edges and is not active; this
    /// is asserted defensively (see DESIGN.md "edge cleanup" note) rather
    /// than silently producing a dangling incoming reference.
    pub fn remove(&mut self, name: &str) -> Option<Program> {
        let targets: Vec<SmolStr> = self.programs.get(name).map(|p| p.outgoing().to_vec())?;
        for target in &targets {
            if let Some(t) = self.programs.get_mut(target.as_str()) {
                t.incoming_mut().retain(|n| n != name);
            }
        }
        let removed = self.programs.shift_remove(name);
        if let Some(p) = &removed {
            debug_assert!(!p.has_incoming(), "removed program {name} still has dependents");
            debug_assert!(!self.is_active(name), "removed the active program {name}");
        }
        removed
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
