// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job processing: read, normalize, prompt, dispatch, parse, emit.

use crate::emit::{Emission, Emitter};
use jr_adapters::{SessionConnector, SessionPool};
use jr_core::{
    build_prompt, normalize, parse_reply, rfc3339, ArtifactSet, CapabilitySet, Clock, EventKind,
    Job, JobId, JobViews, Metrics, NormalizeError, Normalized, Outcome, ParserConfig,
    ResultEnvelope, ResultRefs, WorkerId, Zone,
};
use futures_util::FutureExt;
use jr_storage::Ledger;
use serde_json::{json, Value};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;

pub const DEFAULT_WORKER_ID: &str = "webrelay_worker";
pub const DEFAULT_LLM_BACKEND: &str = "chatgpt";

/// Reasons a job is dropped before a result can be produced. The file is
/// left where it is.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to read job {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed job {}: {source}", path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unusable job {}: {source}", path.display())]
    Normalize {
        path: PathBuf,
        #[source]
        source: NormalizeError,
    },
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub worker_id: WorkerId,
    pub llm_backend: String,
    /// Kinds this relay accepts; also what it advertises on registration.
    pub capabilities: CapabilitySet,
    pub parser: ParserConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            worker_id: WorkerId::new(DEFAULT_WORKER_ID),
            llm_backend: DEFAULT_LLM_BACKEND.to_string(),
            capabilities: CapabilitySet::default(),
            parser: ParserConfig::default(),
        }
    }
}

/// What happened to one dequeued path.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// An envelope was built and emitted.
    Completed { job_id: JobId, ok: bool, emission: Emission },
    /// The kind is not in the capability set; the file stays in intake.
    Skipped { job_id: JobId, kind: String },
    /// The file was gone by the time it was dequeued.
    Vanished,
}

pub struct Relay<S: SessionConnector, C: Clock> {
    pool: SessionPool<S>,
    emitter: Emitter<C>,
    ledger: Arc<Ledger<C>>,
    clock: C,
    config: RelayConfig,
}

impl<S: SessionConnector, C: Clock> Relay<S, C> {
    pub fn new(
        pool: SessionPool<S>,
        emitter: Emitter<C>,
        ledger: Arc<Ledger<C>>,
        clock: C,
        config: RelayConfig,
    ) -> Self {
        Self { pool, emitter, ledger, clock, config }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn pool(&self) -> &SessionPool<S> {
        &self.pool
    }

    /// Process the job file at `path` end to end.
    ///
    /// Only failures to obtain a usable document are errors. Anything that
    /// goes wrong after that is reported through an `ok=false` envelope.
    pub async fn process(&self, path: &Path) -> Result<JobOutcome, RelayError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "job file gone, skipping");
                return Ok(JobOutcome::Vanished);
            }
            Err(source) => return Err(RelayError::Read { path: path.to_path_buf(), source }),
        };
        let document: Value = serde_json::from_str(&content)
            .map_err(|source| RelayError::Malformed { path: path.to_path_buf(), source })?;
        let Normalized { job, views } = normalize(document, path)
            .map_err(|source| RelayError::Normalize { path: path.to_path_buf(), source })?;

        if !self.config.capabilities.supports(job.kind()) {
            tracing::debug!(job_id = %job.id(), kind = job.kind(), "unsupported job kind, skipping");
            self.ledger.record(
                EventKind::JobSkipped,
                job.id(),
                job.trace_id(),
                Zone::Intake,
                None,
                json!({"kind": job.kind(), "reason": "unsupported_kind"}),
            );
            return Ok(JobOutcome::Skipped { job_id: job.id().clone(), kind: job.kind().to_string() });
        }

        let span = tracing::info_span!(
            "job",
            job_id = %job.id(),
            kind = job.kind(),
            schema = %job.schema(),
        );
        Ok(self.relay(job, views).instrument(span).await)
    }

    async fn relay(&self, job: Job, views: JobViews) -> JobOutcome {
        let started = self.clock.now();
        tracing::info!("processing job");

        let artifacts = ArtifactSet::from_view(&views.artifacts);
        let prompt = build_prompt(&job, &views, &artifacts);
        tracing::debug!(template = %prompt.template, chars = prompt.text.chars().count(), "prompt built");

        let exchange = async {
            match self.pool.dispatch(&prompt.text).await {
                Ok(dispatched) => {
                    let parsed = parse_reply(&dispatched.reply.answer, &self.config.parser);
                    tracing::info!(session = %dispatched.session, reply = parsed.kind(), "reply received");
                    Outcome::success(parsed)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "dispatch failed");
                    Outcome::failure(e.to_string())
                }
            }
        };
        let outcome = match AssertUnwindSafe(exchange).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(error = %message, "job processing panicked");
                Outcome::failure(format!("job processing panicked: {message}"))
            }
        };

        let elapsed = self.clock.now().saturating_duration_since(started);
        let envelope = ResultEnvelope {
            job_id: job.id().clone(),
            outcome,
            completed_at: rfc3339(self.clock.utc_now()),
            metrics: Metrics {
                execution_time_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
                llm_backend: Some(self.config.llm_backend.clone()),
            },
            refs: ResultRefs {
                trace_id: job.trace_id().clone(),
                worker_id: self.config.worker_id.clone(),
            },
        };

        let emission = self.emitter.emit(&job, &envelope);
        JobOutcome::Completed { job_id: job.id().clone(), ok: envelope.ok(), emission }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
