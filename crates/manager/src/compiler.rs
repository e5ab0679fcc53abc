// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The compiler (§6): turns config source into a loadable artifact.
//!
//! Out of scope to implement for real (§1 non-goals) - this crate only
//! depends on the narrow interface the dispatcher needs, modeled as a
//! trait. [`StubCompiler`] is the one implementation on offer: it writes
//! whatever it is given verbatim rather than invoking a real toolchain, and
//! is what both `cachemgrd`'s binary and its tests wire in.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::CompilerError;

/// Where the config's source text comes from: `vcl.load` gives a path on
/// disk, `vcl.inline` gives source text directly (§4.E load/inline).
#[derive(Debug, Clone)]
pub enum Source {
    Path(PathBuf),
    Inline(String),
}

/// Compiles one named config's source into an artifact under `dest_dir`.
/// `dest_dir` is the config's own subdirectory of the artifact root
/// (§5 "shared resources"); the compiler is responsible only for the file
/// it writes there, not for creating or removing the directory itself.
#[async_trait]
pub trait Compiler: Send + Sync {
    async fn compile(&self, name: &str, source: &Source, dest_dir: &Path) -> Result<PathBuf, CompilerError>;
}

use parking_lot::Mutex;

/// Writes whatever source it is given to `dest_dir/<name>.so` without
/// compiling anything. [`StubCompiler::fail_next`] arms a one-shot failure
/// with the given diagnostic, for exercising rollback (§8 scenario 6) -
/// production code never calls it, it is purely a test hook.
#[derive(Default)]
pub struct StubCompiler {
    next_failure: Mutex<Option<String>>,
}

impl StubCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn fail_next(&self, diagnostic: impl Into<String>) {
        *self.next_failure.lock() = Some(diagnostic.into());
    }
}

#[async_trait]
impl Compiler for StubCompiler {
    async fn compile(&self, name: &str, source: &Source, dest_dir: &Path) -> Result<PathBuf, CompilerError> {
        if let Some(diagnostic) = self.next_failure.lock().take() {
            return Err(CompilerError(diagnostic));
        }
        std::fs::create_dir_all(dest_dir).map_err(|e| CompilerError(e.to_string()))?;
        let artifact = dest_dir.join(format!("{name}.so"));
        let bytes: &[u8] = match source {
            Source::Inline(text) => text.as_bytes(),
            Source::Path(_) => b"stub artifact",
        };
        std::fs::write(&artifact, bytes).map_err(|e| CompilerError(e.to_string()))?;
        Ok(artifact)
    }
}
