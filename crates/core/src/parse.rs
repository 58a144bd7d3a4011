// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response parser: raw model reply to a typed [`ParseResult`].
//!
//! Parsing never fails. Anything that does not yield an LCP-shaped JSON
//! object degrades to the narrative variant.

use crate::value::{display_value, lookup, truncate_chars};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default bound on the narrative summary.
pub const DEFAULT_SUMMARY_MAX_CHARS: usize = 500;

const ACTION_FOLLOWUP: &str = "create_followup_jobs";
const ACTION_ANALYSIS: &str = "analysis_result";
const LCP_ACTIONS: [&str; 3] = [ACTION_FOLLOWUP, ACTION_ANALYSIS, "final_answer"];

/// Keys that never become follow-up params when a spec has no explicit bag.
const SPEC_RESERVED_KEYS: [&str; 6] = ["kind", "action", "name", "job_name", "args", "params"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Marker after which the answer starts. Only text after its last
    /// occurrence is examined.
    pub sentinel: Option<String>,
    /// When false, every reply is treated as narrative.
    pub auto_detect_lcp: bool,
    pub summary_max_chars: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self { sentinel: None, auto_detect_lcp: true, summary_max_chars: DEFAULT_SUMMARY_MAX_CHARS }
    }
}

/// A follow-up job requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub kind: String,
    pub params: Map<String, Value>,
}

/// Structured LCP reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LcpReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    pub action: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub new_jobs: Vec<JobSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commentary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lcp_version: Option<String>,
}

/// Free-form reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextReply {
    /// Bounded prefix of the trimmed reply.
    pub summary: String,
    /// The full reply.
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParseResult {
    Lcp(LcpReply),
    Text(TextReply),
}

impl ParseResult {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Lcp(_) => "lcp",
            Self::Text(_) => "text",
        }
    }

    pub fn is_lcp(&self) -> bool {
        matches!(self, Self::Lcp(_))
    }
}

/// Parse a raw reply.
pub fn parse_reply(raw: &str, config: &ParserConfig) -> ParseResult {
    let examined = match config.sentinel.as_deref().filter(|s| !s.is_empty()) {
        Some(sentinel) => raw.rfind(sentinel).map_or(raw, |at| &raw[at + sentinel.len()..]),
        None => raw,
    };

    if config.auto_detect_lcp {
        if let Some(lcp) = extract_object(examined).as_ref().and_then(as_lcp) {
            return ParseResult::Lcp(lcp);
        }
    }

    let trimmed = examined.trim();
    ParseResult::Text(TextReply {
        summary: truncate_chars(trimmed, config.summary_max_chars).to_string(),
        text: raw.to_string(),
    })
}

/// First JSON object found in fenced blocks, else in the first balanced
/// brace span of the whole text.
fn extract_object(text: &str) -> Option<Map<String, Value>> {
    fenced_blocks(text)
        .into_iter()
        .chain(std::iter::once(text))
        .find_map(|candidate| {
            parse_object(candidate.trim())
                .or_else(|| balanced_span(candidate).and_then(parse_object))
        })
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Contents of every ``` fenced block, language tag line excluded.
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after_open = &rest[open + 3..];
        // Language tag runs to the end of the opening line
        let body_start = after_open.find('\n').map_or(after_open.len(), |nl| nl + 1);
        let body = &after_open[body_start..];
        let Some(close) = body.find("```") else {
            break;
        };
        blocks.push(&body[..close]);
        rest = &body[close + 3..];
    }
    blocks
}

/// The first `{...}` span whose braces balance, skipping braces inside
/// string literals.
fn balanced_span(text: &str) -> Option<&str> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        if let Some(end) = closing_brace(&text[start..]) {
            return Some(&text[start..start + end + 1]);
        }
        search_from = start + 1;
    }
    None
}

fn closing_brace(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Whether an object carries any of the LCP markers.
pub fn is_lcp_message(object: &Map<String, Value>) -> bool {
    object.contains_key("lcp_version")
        || object.get("type").and_then(Value::as_str) == Some("lcp")
        || object.get("action").and_then(Value::as_str).is_some_and(|a| LCP_ACTIONS.contains(&a))
        || object.contains_key("jobs")
        || object.contains_key("new_jobs")
}

fn as_lcp(object: &Map<String, Value>) -> Option<LcpReply> {
    if !is_lcp_message(object) {
        return None;
    }
    let root = Value::Object(object.clone());
    let jobs = lookup(&root, &["new_jobs"])
        .or_else(|| lookup(&root, &["jobs"]))
        .and_then(Value::as_array)
        .filter(|jobs| !jobs.is_empty());
    let action = match lookup(&root, &["action"]).and_then(Value::as_str) {
        Some(action) => action.to_string(),
        None if jobs.is_some() => ACTION_FOLLOWUP.to_string(),
        None => ACTION_ANALYSIS.to_string(),
    };
    let new_jobs = jobs.map(|jobs| normalize_job_specs(jobs)).unwrap_or_default();

    Some(LcpReply {
        thought: lookup(&root, &["thought"]).map(display_value),
        action,
        new_jobs,
        answer: object.get("answer").filter(|a| !a.is_null()).cloned(),
        commentary: lookup(&root, &["commentary"]).map(display_value),
        lcp_version: object.get("lcp_version").filter(|v| !v.is_null()).map(display_value),
    })
}

/// Normalize follow-up specs to `{kind, params}`.
///
/// Kind comes from `kind`, `action` or `name`; specs with none are dropped.
/// Params come from an explicit `params` or `args` object, else from the
/// remaining top-level fields.
pub fn normalize_job_specs(jobs: &[Value]) -> Vec<JobSpec> {
    jobs.iter()
        .filter(|spec| spec.is_object())
        .filter_map(|spec| {
            let kind = lookup(spec, &["kind"])
                .or_else(|| lookup(spec, &["action"]))
                .or_else(|| lookup(spec, &["name"]))
                .map(display_value)?;
            let explicit = lookup(spec, &["params"])
                .or_else(|| lookup(spec, &["args"]))
                .and_then(Value::as_object);
            let params = match explicit {
                Some(params) => params.clone(),
                None => spec
                    .as_object()
                    .map(|obj| {
                        obj.iter()
                            .filter(|(k, _)| !SPEC_RESERVED_KEYS.contains(&k.as_str()))
                            .map(|(k, v)| (k.clone(), v.clone()))
                            .collect()
                    })
                    .unwrap_or_default(),
            };
            Some(JobSpec { kind, params })
        })
        .collect()
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
