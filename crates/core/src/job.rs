// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job documents and the canonical job.
//!
//! Producers have written two envelope shapes over time. [`JobDocument`]
//! models both as a tagged union with an explicit extension map per level,
//! so fields the relay doesn't know about survive untouched. [`Job`] is what
//! the rest of the pipeline sees after normalization.

use crate::id::{JobId, TraceId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Marker value of `schema_version` for the envelope shape.
pub const JOB_ENVELOPE_V1: &str = "job_envelope_v1";

/// Kind assumed for legacy documents that omit `kind`.
pub const DEFAULT_LEGACY_KIND: &str = "llm_call";

/// Which normalizer path produced a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaVersion {
    Legacy,
    EnvelopeV1,
}

crate::str_enum! {
    SchemaVersion {
        Legacy => "legacy",
        EnvelopeV1 => "envelope_v1",
    }
}

/// `refs` block shared by both shapes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Refs {
    pub trace_id: Option<String>,
    pub extensions: Map<String, Value>,
}

/// `action` block of an envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvelopeAction {
    pub kind: Option<String>,
    pub params: Map<String, Value>,
    pub extensions: Map<String, Value>,
}

/// `schema_version = "job_envelope_v1"` documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvelopeDoc {
    pub job_id: Option<String>,
    pub intent: Option<String>,
    pub action: EnvelopeAction,
    pub refs: Refs,
    pub extensions: Map<String, Value>,
}

/// Pre-envelope documents with a top-level `kind` and `payload`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LegacyDoc {
    pub job_id: Option<String>,
    pub kind: Option<String>,
    pub payload: Map<String, Value>,
    pub refs: Refs,
    pub extensions: Map<String, Value>,
}

/// A job document in one of the supported historical shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum JobDocument {
    EnvelopeV1(EnvelopeDoc),
    Legacy(LegacyDoc),
}

/// Errors from reading a job document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("job document must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

impl JobDocument {
    /// Detect the shape by its versioning marker and split known fields from
    /// extensions. Only a non-object document is rejected; mistyped fields
    /// read as absent.
    pub fn classify(document: &Value) -> Result<Self, DocumentError> {
        let Some(map) = document.as_object() else {
            return Err(DocumentError::NotAnObject(json_type(document)));
        };
        let mut map = map.clone();
        let is_envelope =
            map.get("schema_version").and_then(Value::as_str) == Some(JOB_ENVELOPE_V1);
        if is_envelope {
            map.remove("schema_version");
            let job_id = take_id(&mut map, "job_id");
            let intent = take_string(&mut map, "intent");
            let mut action_map = take_object(&mut map, "action");
            let action = EnvelopeAction {
                kind: take_string(&mut action_map, "kind"),
                params: take_object(&mut action_map, "params"),
                extensions: action_map,
            };
            let refs = take_refs(&mut map);
            Ok(Self::EnvelopeV1(EnvelopeDoc { job_id, intent, action, refs, extensions: map }))
        } else {
            let job_id = take_id(&mut map, "job_id");
            let kind = take_string(&mut map, "kind");
            let payload = take_object(&mut map, "payload");
            let refs = take_refs(&mut map);
            Ok(Self::Legacy(LegacyDoc { job_id, kind, payload, refs, extensions: map }))
        }
    }

    pub fn schema(&self) -> SchemaVersion {
        match self {
            Self::EnvelopeV1(_) => SchemaVersion::EnvelopeV1,
            Self::Legacy(_) => SchemaVersion::Legacy,
        }
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            Self::EnvelopeV1(doc) => doc.job_id.as_deref(),
            Self::Legacy(doc) => doc.job_id.as_deref(),
        }
    }

    pub fn refs(&self) -> &Refs {
        match self {
            Self::EnvelopeV1(doc) => &doc.refs,
            Self::Legacy(doc) => &doc.refs,
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::String(_)) | Some(Value::Null) | None => None,
        // Keep mistyped values visible to the fallback template
        Some(other) => {
            map.insert(key.to_string(), other);
            None
        }
    }
}

/// IDs are usually strings but some producers emit numbers.
fn take_id(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::Number(n)) => {
            let id = n.to_string();
            map.remove(key);
            Some(id)
        }
        _ => take_string(map, key),
    }
}

fn take_object(map: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match map.remove(key) {
        Some(Value::Object(obj)) => obj,
        Some(Value::Null) | None => Map::new(),
        Some(other) => {
            map.insert(key.to_string(), other);
            Map::new()
        }
    }
}

fn take_refs(map: &mut Map<String, Value>) -> Refs {
    let mut refs = take_object(map, "refs");
    Refs { trace_id: take_id(&mut refs, "trace_id"), extensions: refs }
}

/// The canonical job, immutable once built.
///
/// Enrichment derived from the job (parameter views, artifacts) is carried
/// next to it in [`crate::normalize::JobViews`], never written back.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    id: JobId,
    kind: String,
    payload: Value,
    schema: SchemaVersion,
    source: PathBuf,
    trace_id: TraceId,
    document: Value,
}

impl Job {
    pub(crate) fn new(
        id: JobId,
        kind: String,
        payload: Value,
        schema: SchemaVersion,
        source: PathBuf,
        trace_id: TraceId,
        document: Value,
    ) -> Self {
        Self { id, kind, payload, schema, source, trace_id, document }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Backend-agnostic payload bag (unknown fields preserved).
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    pub fn is_envelope(&self) -> bool {
        self.schema == SchemaVersion::EnvelopeV1
    }

    /// Path of the file this job was read from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn trace_id(&self) -> &TraceId {
        &self.trace_id
    }

    /// The document exactly as it was parsed.
    pub fn document(&self) -> &Value {
        &self.document
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
