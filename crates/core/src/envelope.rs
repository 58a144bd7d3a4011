// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical result envelope handed back to the orchestrator.
//!
//! `ok`, `result` and `error` are derived from a single [`Outcome`], so an
//! envelope can never claim success while carrying an error (or the
//! reverse). Deserialization rejects documents that do.

use crate::id::{JobId, TraceId, WorkerId};
use crate::parse::ParseResult;
use serde::{Deserialize, Serialize};

/// Value of `schema_version` on every result envelope.
pub const RESULT_ENVELOPE_V1: &str = "result_envelope_v1";

/// Summary used when a reply offers nothing better.
pub const DEFAULT_SUMMARY: &str = "Action processed.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultBody {
    pub summary: String,
    pub data: ParseResult,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(ResultBody),
    Failure(String),
}

impl Outcome {
    /// Successful outcome with the summary chosen from the parsed reply.
    pub fn success(parsed: ParseResult) -> Self {
        Self::Success(ResultBody { summary: summary_for(&parsed), data: parsed })
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure(error.into())
    }
}

/// Narrative summary, else LCP thought, else commentary, else a string
/// answer.
pub fn summary_for(parsed: &ParseResult) -> String {
    let candidate = match parsed {
        ParseResult::Text(text) => Some(text.summary.as_str()),
        ParseResult::Lcp(lcp) => [lcp.thought.as_deref(), lcp.commentary.as_deref()]
            .into_iter()
            .flatten()
            .chain(lcp.answer.as_ref().and_then(|a| a.as_str()))
            .find(|s| !s.is_empty()),
    };
    match candidate {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => DEFAULT_SUMMARY.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metrics {
    pub execution_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_backend: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRefs {
    pub trace_id: TraceId,
    pub worker_id: WorkerId,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "WireEnvelope")]
pub struct ResultEnvelope {
    pub job_id: JobId,
    pub outcome: Outcome,
    /// RFC 3339 completion time.
    pub completed_at: String,
    pub metrics: Metrics,
    pub refs: ResultRefs,
}

impl ResultEnvelope {
    pub fn ok(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    pub fn result(&self) -> Option<&ResultBody> {
        match &self.outcome {
            Outcome::Success(body) => Some(body),
            Outcome::Failure(_) => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Success(_) => None,
            Outcome::Failure(error) => Some(error),
        }
    }

    /// Archive status merged into the original job document.
    pub fn status(&self) -> &'static str {
        if self.ok() {
            "completed"
        } else {
            "failed"
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Serialize)]
struct WireEnvelopeRef<'a> {
    schema_version: &'a str,
    job_id: &'a JobId,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a ResultBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
    completed_at: &'a str,
    metrics: &'a Metrics,
    refs: &'a ResultRefs,
}

impl Serialize for ResultEnvelope {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireEnvelopeRef {
            schema_version: RESULT_ENVELOPE_V1,
            job_id: &self.job_id,
            ok: self.ok(),
            result: self.result(),
            error: self.error(),
            completed_at: &self.completed_at,
            metrics: &self.metrics,
            refs: &self.refs,
        }
        .serialize(serializer)
    }
}

#[derive(Deserialize)]
struct WireEnvelope {
    schema_version: String,
    job_id: JobId,
    ok: bool,
    #[serde(default)]
    result: Option<ResultBody>,
    #[serde(default)]
    error: Option<String>,
    completed_at: String,
    metrics: Metrics,
    refs: ResultRefs,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("unsupported schema_version {0:?}")]
    SchemaVersion(String),
    #[error("ok envelope must carry a result and no error")]
    SuccessShape,
    #[error("failed envelope must carry an error and no result")]
    FailureShape,
}

impl TryFrom<WireEnvelope> for ResultEnvelope {
    type Error = EnvelopeError;

    fn try_from(wire: WireEnvelope) -> Result<Self, Self::Error> {
        if wire.schema_version != RESULT_ENVELOPE_V1 {
            return Err(EnvelopeError::SchemaVersion(wire.schema_version));
        }
        let outcome = match (wire.ok, wire.result, wire.error) {
            (true, Some(body), None) => Outcome::Success(body),
            (true, _, _) => return Err(EnvelopeError::SuccessShape),
            (false, None, Some(error)) => Outcome::Failure(error),
            (false, _, _) => return Err(EnvelopeError::FailureShape),
        };
        Ok(Self {
            job_id: wire.job_id,
            outcome,
            completed_at: wire.completed_at,
            metrics: wire.metrics,
            refs: wire.refs,
        })
    }
}

#[cfg(test)]
#[path = "envelope_tests.rs"]
mod tests;
