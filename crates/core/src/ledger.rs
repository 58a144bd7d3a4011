// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit ledger entry types. Writing lives in `jr-storage`.

use crate::id::{JobId, TraceId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `actor` recorded on every entry this relay appends.
pub const LEDGER_ACTOR: &str = "webrelay";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    ResultWritten,
    ProposalWritten,
    JobArchived,
    JobSkipped,
}

crate::str_enum! {
    EventKind {
        ResultWritten => "RESULT_WRITTEN",
        ProposalWritten => "PROPOSAL_WRITTEN",
        JobArchived => "JOB_ARCHIVED",
        JobSkipped => "JOB_SKIPPED",
    }
}

/// Ledger partition an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Intake,
    Narrative,
    Output,
    Archive,
}

crate::str_enum! {
    Zone {
        Intake => "intake",
        Narrative => "narrative",
        Output => "output",
        Archive => "archive",
    }
}

/// Digest of the file an event refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Relative to the relay root, `/`-separated.
    pub path: String,
    /// Lowercase hex SHA-256 of the file contents.
    pub sha256: String,
    pub bytes: u64,
}

/// One line of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub ts: String,
    pub actor: String,
    pub event: EventKind,
    pub job_id: JobId,
    pub trace_id: TraceId,
    pub zone: Zone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactRef>,
    #[serde(default = "crate::value::empty_object")]
    pub meta: Value,
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
