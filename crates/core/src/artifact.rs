// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifacts contributed by earlier turns of a chain.
//!
//! The orchestrator owns the append-only rule for artifact keys; the relay
//! only reads them to build context.

use crate::value::truthy;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A named value from a prior turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub value: Value,
    pub meta: Option<ArtifactMeta>,
}

impl Artifact {
    /// Read one artifact entry. Entries are either `{value, meta}` wrappers or
    /// the bare value itself.
    pub fn from_entry(entry: &Value) -> Self {
        match entry.as_object().and_then(|obj| obj.get("value").filter(|v| truthy(v))) {
            Some(value) => {
                let meta = entry
                    .get("meta")
                    .and_then(|m| serde_json::from_value::<ArtifactMeta>(m.clone()).ok());
                Self { value: value.clone(), meta }
            }
            None => Self { value: entry.clone(), meta: None },
        }
    }
}

/// Artifacts keyed by name, in the order the producer wrote them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactSet {
    entries: IndexMap<String, Artifact>,
}

impl ArtifactSet {
    /// Build from an artifacts view. Non-object views yield an empty set.
    pub fn from_view(view: &Value) -> Self {
        let entries: IndexMap<String, Artifact> = view
            .as_object()
            .map(|obj| {
                obj.iter().map(|(key, entry)| (key.clone(), Artifact::from_entry(entry))).collect()
            })
            .unwrap_or_default();
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&Artifact> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Artifact)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
