// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::job::JOB_ENVELOPE_V1;
use crate::normalize::{normalize, Normalized, NormalizeError};
use serde_json::{json, Value};
use std::path::Path;

// ── Job document factories ──────────────────────────────────────────────────

/// Legacy `llm_call` document with a single prompt.
pub fn llm_call_doc(job_id: &str, prompt: &str) -> Value {
    legacy_doc(job_id, "llm_call", json!({"params": {"prompt": prompt}}))
}

pub fn legacy_doc(job_id: &str, kind: &str, payload: Value) -> Value {
    json!({"job_id": job_id, "kind": kind, "payload": payload})
}

pub fn envelope_doc(job_id: &str, kind: &str, params: Value) -> Value {
    json!({
        "schema_version": JOB_ENVELOPE_V1,
        "job_id": job_id,
        "action": {"kind": kind, "params": params},
        "refs": {"trace_id": format!("trace-{job_id}")},
    })
}

/// Normalize a document as if read from `<job_id>.json`.
pub fn normalized(doc: Value) -> Result<Normalized, NormalizeError> {
    let name = doc.get("job_id").and_then(Value::as_str).unwrap_or("job").to_string();
    normalize(doc, Path::new(&format!("/relay/in/{name}.json")))
}

// ── Model reply factories ───────────────────────────────────────────────────

/// A fenced LCP resolution, the way a chat front end usually returns it.
pub fn lcp_answer_reply(answer: &str) -> String {
    let body = json!({"ok": true, "action": "analysis_result", "answer": answer});
    format!("Here is the result:\n```json\n{body}\n```")
}

pub fn lcp_followup_reply(thought: &str, kinds: &[&str]) -> String {
    let jobs: Vec<Value> = kinds.iter().map(|k| json!({"kind": k, "params": {}})).collect();
    json!({"ok": true, "action": "create_followup_jobs", "thought": thought, "new_jobs": jobs})
        .to_string()
}
