// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Context block shared by every prompt template.
//!
//! Sections always appear in [`SectionKind`] order and a section with no
//! source data is left out entirely, so the block's length is a pure
//! function of the job's views.

use crate::artifact::{Artifact, ArtifactSet};
use crate::id::short;
use crate::normalize::JobViews;
use crate::value::{display_value, empty_object, lookup, lookup_str, pretty, truncate_chars};
use indexmap::IndexMap;
use serde_json::Value;

/// Max characters of file content quoted per `read_file` result.
pub const READ_CONTENT_LIMIT: usize = 1500;
/// Max entries listed per directory listing result.
pub const LIST_FILES_LIMIT: usize = 100;
/// Max characters of the JSON dump for any other tool result.
pub const DATA_DUMP_LIMIT: usize = 1000;
/// Max characters of the fallback latest-result dump.
pub const LATEST_RESULT_LIMIT: usize = 2000;
/// Max characters of a scalar artifact summary.
pub const ARTIFACT_SUMMARY_LIMIT: usize = 300;
/// Number of array items previewed in an artifact summary.
pub const ARTIFACT_PREVIEW_ITEMS: usize = 5;

const JOB_TAG_CHARS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SectionKind {
    InjectedContext,
    Feedback,
    LatestResult,
    Artifacts,
}

impl SectionKind {
    pub fn heading(self) -> &'static str {
        match self {
            Self::InjectedContext => "INJECTED CONTEXT",
            Self::Feedback => "FEEDBACK (Execution Results)",
            Self::LatestResult => "LATEST RESULT (Fallback)",
            Self::Artifacts => "ARTIFACTS (Key Insights)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub body: String,
}

/// Ordered, labeled context sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextBlock {
    sections: Vec<Section>,
}

impl ContextBlock {
    pub fn build(views: &JobViews, artifacts: &ArtifactSet) -> Self {
        let payload = &views.payload;
        let params = &views.params;
        let input = lookup(params, &["input"]).cloned().unwrap_or_else(empty_object);
        let tool_results: &[Value] =
            input.get("tool_results").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);

        let mut sections = Vec::new();

        let injected = lookup(params, &["context"])
            .or_else(|| lookup(payload, &["context"]))
            .or_else(|| lookup(payload, &["task", "params", "context"]))
            .or_else(|| lookup(&input, &["context"]));
        if let Some(ctx) = injected {
            let body = match ctx {
                Value::Object(_) | Value::Array(_) => pretty(ctx),
                other => display_value(other),
            };
            sections.push(Section { kind: SectionKind::InjectedContext, body: format!("{}\n", body) });
        }

        if !tool_results.is_empty() {
            sections.push(Section { kind: SectionKind::Feedback, body: feedback(tool_results) });
        } else if let Some(last) =
            lookup(payload, &["last_result"]).or_else(|| lookup(params, &["last_result"]))
        {
            let data = lookup(last, &["data"]).unwrap_or(last);
            sections.push(Section {
                kind: SectionKind::LatestResult,
                body: format!("{}\n", truncate_chars(&pretty(data), LATEST_RESULT_LIMIT)),
            });
        }

        let fallback_artifacts;
        let active = if artifacts.is_empty() {
            fallback_artifacts = ArtifactSet::from_view(&input["artifacts"]);
            &fallback_artifacts
        } else {
            artifacts
        };
        if !active.is_empty() {
            let body = active
                .iter()
                .map(|(key, artifact)| format!("- {}: {}\n", key, artifact_summary(artifact)))
                .collect();
            sections.push(Section { kind: SectionKind::Artifacts, body });
        }

        Self { sections }
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            out.push_str("\n### ");
            out.push_str(section.kind.heading());
            out.push_str(":\n");
            out.push_str(&section.body);
        }
        out
    }
}

/// Tool results grouped by their `kind` tag in first-appearance order.
fn feedback(tool_results: &[Value]) -> String {
    let mut groups: IndexMap<&str, Vec<&Value>> = IndexMap::new();
    for item in tool_results {
        let kind = lookup_str(item, &["kind"]).unwrap_or("other");
        groups.entry(kind).or_default().push(item);
    }

    let mut out = String::new();
    for (kind, items) in groups {
        out.push_str(&format!("#### [{}] ({} items):\n", kind.to_uppercase(), items.len()));
        for item in items {
            out.push_str(&format_tool_result(kind, item));
        }
    }
    out
}

fn format_tool_result(kind: &str, item: &Value) -> String {
    let empty = empty_object();
    let mut data = lookup(item, &["result"]).unwrap_or(&empty);
    // Some workers wrap their output as {ok, result}
    if lookup(data, &["ok"]).is_some() {
        if let Some(inner) = lookup(data, &["result"]) {
            data = inner;
        }
    }
    let job_tag = lookup_str(item, &["job_id"])
        .map(|id| format!(" (job:{})", short(id, JOB_TAG_CHARS)))
        .unwrap_or_default();

    match kind {
        "read_file" | "read_read" => {
            let path = text_at(data, &["path"])
                .or_else(|| text_at(item, &["params", "path"]))
                .unwrap_or_else(|| "unknown".to_string());
            let content = text_at(data, &["content"]).unwrap_or_default();
            format!(
                "- FILE: {}{}\n```\n{}\n```\n",
                path,
                job_tag,
                truncate_chars(&content, READ_CONTENT_LIMIT)
            )
        }
        "walk_tree" | "list_files" => {
            let files: &[Value] =
                data.get("files").and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);
            let path = text_at(data, &["path"])
                .or_else(|| text_at(data, &["root"]))
                .or_else(|| text_at(item, &["params", "path"]))
                .unwrap_or_else(|| "root".to_string());
            let listed: Vec<String> =
                files.iter().take(LIST_FILES_LIMIT).map(display_value).collect();
            let more = if files.len() > LIST_FILES_LIMIT { "\n  ..." } else { "" };
            format!(
                "- PATH: {}{} ({} files)\n  {}{}\n",
                path,
                job_tag,
                files.len(),
                listed.join("\n  "),
                more
            )
        }
        _ => format!("- DATA{}:\n{}\n", job_tag, truncate_chars(&pretty(data), DATA_DUMP_LIMIT)),
    }
}

fn artifact_summary(artifact: &Artifact) -> String {
    match &artifact.value {
        Value::Array(items) => {
            let preview: Vec<&Value> = items.iter().take(ARTIFACT_PREVIEW_ITEMS).collect();
            let preview = serde_json::to_string(&preview).unwrap_or_default();
            format!("{} items: {}...", items.len(), preview)
        }
        other => truncate_chars(&display_value(other), ARTIFACT_SUMMARY_LIMIT).to_string(),
    }
}

/// Truthy value at `path` rendered as text.
pub(crate) fn text_at(root: &Value, path: &[&str]) -> Option<String> {
    lookup(root, path).map(display_value)
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
