// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result emission: write the envelope, archive the job, record both in the
//! ledger.

use jr_core::{Clock, EventKind, Job, ResultEnvelope, Zone};
use jr_storage::{Archiver, Ledger, ResultWriter};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

/// Where a job's outputs ended up. `None` means that step failed and was
/// logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emission {
    pub result: Option<PathBuf>,
    pub archive: Option<PathBuf>,
}

pub struct Emitter<C: Clock> {
    results: ResultWriter,
    archiver: Archiver,
    ledger: Arc<Ledger<C>>,
}

impl<C: Clock> Emitter<C> {
    pub fn new(results: ResultWriter, archiver: Archiver, ledger: Arc<Ledger<C>>) -> Self {
        Self { results, archiver, ledger }
    }

    /// Write the result file, then archive the job file.
    ///
    /// A job whose result could not be written stays in the intake
    /// directory and is picked up again by the next startup scan. Nothing
    /// here propagates: every failure is logged and reflected in the
    /// returned [`Emission`].
    pub fn emit(&self, job: &Job, envelope: &ResultEnvelope) -> Emission {
        let Some(name) = job.source().file_name().and_then(|n| n.to_str()) else {
            tracing::warn!(
                job_id = %job.id(),
                source = %job.source().display(),
                "job source has no usable file name, result not written"
            );
            return Emission { result: None, archive: None };
        };

        let result = match self.results.write(name, envelope) {
            Ok(path) => path,
            Err(e) => {
                tracing::error!(job_id = %job.id(), error = %e, "failed to write result");
                return Emission { result: None, archive: None };
            }
        };
        tracing::info!(
            job_id = %job.id(),
            ok = envelope.ok(),
            path = %result.display(),
            "result written"
        );
        self.ledger.record(
            EventKind::ResultWritten,
            job.id(),
            job.trace_id(),
            Zone::Output,
            Some(&result),
            json!({"ok": envelope.ok(), "llm_backend": envelope.metrics.llm_backend}),
        );

        let archive = match self.archiver.archive(job.source(), envelope) {
            Ok(path) => {
                self.ledger.record(
                    EventKind::JobArchived,
                    job.id(),
                    job.trace_id(),
                    Zone::Archive,
                    Some(&path),
                    json!({"status": envelope.status()}),
                );
                Some(path)
            }
            Err(e) => {
                tracing::warn!(job_id = %job.id(), error = %e, "failed to archive job");
                None
            }
        };

        Emission { result: Some(result), archive }
    }
}

#[cfg(test)]
#[path = "emit_tests.rs"]
mod tests;
