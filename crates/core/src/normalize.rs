// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema normalizer: any supported job shape to one canonical [`Job`] plus
//! the derived views the prompt builder reads.
//!
//! | view        | envelope v1                          | legacy                                     |
//! |-------------|--------------------------------------|--------------------------------------------|
//! | `payload`   | `action.params`                      | `payload`                                  |
//! | `params`    | `action.params` minus `artifacts`    | `payload.task.params`, else `payload.params` |
//! | `artifacts` | `action.params.artifacts`            | `payload.artifacts`                        |
//!
//! Normalization is additive: nothing is validated beyond the document being
//! an object, and unknown fields stay in `payload`.

use crate::id::{JobId, TraceId};
use crate::job::{DocumentError, Job, JobDocument, DEFAULT_LEGACY_KIND};
use crate::value::{lookup, object_or_empty};
use serde_json::{Map, Value};
use std::path::Path;

/// Kind used when an envelope names neither `action.kind` nor `intent`.
pub const UNKNOWN_KIND: &str = "unknown";

/// Derived read-only views over a job, computed once during normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct JobViews {
    pub payload: Value,
    pub params: Value,
    pub artifacts: Value,
}

/// A canonical job together with its derived views.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub job: Job,
    pub views: JobViews,
}

#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Normalize a parsed job document read from `source`.
///
/// When the document carries no `job_id`, the file stem stands in for it.
pub fn normalize(document: Value, source: &Path) -> Result<Normalized, NormalizeError> {
    let parsed = JobDocument::classify(&document)?;
    let schema = parsed.schema();

    let job_id = match parsed.job_id() {
        Some(id) => JobId::new(id),
        None => JobId::new(file_stem(source)),
    };
    let trace_id = match parsed.refs().trace_id.as_deref() {
        Some(trace) => TraceId::new(trace),
        None => TraceId::from(&job_id),
    };

    let (kind, views) = match &parsed {
        JobDocument::EnvelopeV1(env) => {
            let kind = env
                .action
                .kind
                .clone()
                .or_else(|| env.intent.clone())
                .unwrap_or_else(|| UNKNOWN_KIND.to_string());
            let payload = Value::Object(env.action.params.clone());
            let artifacts = object_or_empty(env.action.params.get("artifacts"));
            let params: Map<String, Value> = env
                .action
                .params
                .iter()
                .filter(|(key, _)| key.as_str() != "artifacts")
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            (kind, JobViews { payload, params: Value::Object(params), artifacts })
        }
        JobDocument::Legacy(legacy) => {
            let kind = legacy.kind.clone().unwrap_or_else(|| DEFAULT_LEGACY_KIND.to_string());
            let payload = Value::Object(legacy.payload.clone());
            let params = object_or_empty(
                lookup(&payload, &["task", "params"]).or_else(|| lookup(&payload, &["params"])),
            );
            let artifacts = object_or_empty(legacy.payload.get("artifacts"));
            (kind, JobViews { payload, params, artifacts })
        }
    };

    let job = Job::new(
        job_id,
        kind,
        views.payload.clone(),
        schema,
        source.to_path_buf(),
        trace_id,
        document,
    );
    Ok(Normalized { job, views })
}

fn file_stem(source: &Path) -> String {
    let name = source.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    let stem = name
        .strip_suffix(".json")
        .map(|s| s.strip_suffix(".job").unwrap_or(s))
        .unwrap_or(name);
    if stem.is_empty() {
        UNKNOWN_KIND.to_string()
    } else {
        stem.to_string()
    }
}

impl JobViews {
    /// Empty views, for callers that build prompts without a document.
    pub fn empty() -> Self {
        let empty = Value::Object(Map::new());
        Self { payload: empty.clone(), params: empty.clone(), artifacts: empty }
    }
}

#[cfg(test)]
#[path = "normalize_tests.rs"]
mod tests;
