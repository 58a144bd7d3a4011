// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only audit ledger.
//!
//! One JSON line per event. Each `record()` call opens, appends and closes
//! the file, which is fine for one event per job step.

use jr_core::clock::rfc3339;
use jr_core::ledger::LEDGER_ACTOR;
use jr_core::{ArtifactRef, Clock, EventKind, JobId, LedgerEntry, TraceId, Zone};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ledger serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct Ledger<C: Clock> {
    path: PathBuf,
    root: PathBuf,
    clock: C,
}

impl<C: Clock> Ledger<C> {
    /// `root` is the base artifact paths are recorded relative to.
    pub fn new(path: impl Into<PathBuf>, root: impl Into<PathBuf>, clock: C) -> Self {
        Self { path: path.into(), root: root.into(), clock }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event.
    ///
    /// The artifact is hashed when readable and omitted otherwise. Failures
    /// are logged via tracing but never propagate; the ledger must not break
    /// job processing.
    pub fn record(
        &self,
        event: EventKind,
        job_id: &JobId,
        trace_id: &TraceId,
        zone: Zone,
        artifact: Option<&Path>,
        meta: Value,
    ) {
        let artifact = artifact.and_then(|path| match digest(&self.root, path) {
            Ok(reference) => Some(reference),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "ledger artifact unreadable");
                None
            }
        });
        let entry = LedgerEntry {
            ts: rfc3339(self.clock.utc_now()),
            actor: LEDGER_ACTOR.to_string(),
            event,
            job_id: job_id.clone(),
            trace_id: trace_id.clone(),
            zone,
            artifact,
            meta,
        };
        if let Err(e) = self.append(&entry) {
            tracing::warn!(
                event = %event,
                job_id = %job_id,
                error = %e,
                "failed to append ledger entry"
            );
        }
    }

    fn append(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(entry)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Read every entry back. Lines that fail to parse are skipped.
    pub fn entries(&self) -> Result<Vec<LedgerEntry>, LedgerError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        Ok(content.lines().filter_map(|line| serde_json::from_str(line).ok()).collect())
    }
}

/// SHA-256 and size of a file, with its path relative to `root`.
pub fn digest(root: &Path, path: &Path) -> Result<ArtifactRef, std::io::Error> {
    let bytes = fs::read(path)?;
    Ok(ArtifactRef {
        path: relative_path(root, path),
        sha256: format!("{:x}", Sha256::digest(&bytes)),
        bytes: bytes.len() as u64,
    })
}

/// `path` relative to `root` with `/` separators. Paths outside `root` are
/// kept as given.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::RootDir => Some(String::new()),
            Component::ParentDir => Some("..".to_string()),
            Component::CurDir | Component::Prefix(_) => None,
        })
        .collect();
    parts.join("/")
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
