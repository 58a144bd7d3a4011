// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::StoreError;
use std::path::{Path, PathBuf};

/// Directory layout under a relay root.
///
/// ```text
/// <root>/
///   in/             job files (watched)
///   out/            <stem>.result.json
///   archive/        processed jobs merged with their result
///   logs/relay.log
///   ledger.jsonl
///   relay.pid
///   relay.toml
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayPaths {
    pub root: PathBuf,
    pub intake: PathBuf,
    pub results: PathBuf,
    pub archive: PathBuf,
    pub ledger: PathBuf,
    pub logs: PathBuf,
    pub lock: PathBuf,
}

impl RelayPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            intake: root.join("in"),
            results: root.join("out"),
            archive: root.join("archive"),
            ledger: root.join("ledger.jsonl"),
            logs: root.join("logs"),
            lock: root.join("relay.pid"),
            root,
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("relay.toml")
    }

    pub fn log_file(&self) -> PathBuf {
        self.logs.join("relay.log")
    }

    /// Create every directory of the layout.
    pub fn ensure_dirs(&self) -> Result<(), StoreError> {
        let ledger_dir = self.ledger.parent().unwrap_or(&self.root);
        for dir in [&self.root, &self.intake, &self.results, &self.archive, &self.logs] {
            create(dir)?;
        }
        create(ledger_dir)
    }
}

impl RelayPaths {
    /// The same layout with every location resolved to an absolute,
    /// symlink-free path. Call after [`RelayPaths::ensure_dirs`].
    pub fn canonicalized(&self) -> Result<Self, StoreError> {
        Ok(Self {
            root: canonical(&self.root)?,
            intake: canonical(&self.intake)?,
            results: canonical(&self.results)?,
            archive: canonical(&self.archive)?,
            ledger: canonical_file(&self.ledger)?,
            logs: canonical(&self.logs)?,
            lock: canonical_file(&self.lock)?,
        })
    }
}

fn canonical(dir: &Path) -> Result<PathBuf, StoreError> {
    dir.canonicalize().map_err(|e| StoreError::io(dir, e))
}

/// Canonical parent joined with the file name; the file need not exist.
fn canonical_file(file: &Path) -> Result<PathBuf, StoreError> {
    match (file.parent(), file.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            Ok(canonical(parent)?.join(name))
        }
        (_, Some(name)) => Ok(canonical(Path::new("."))?.join(name)),
        _ => Ok(file.to_path_buf()),
    }
}

fn create(dir: &Path) -> Result<(), StoreError> {
    std::fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
