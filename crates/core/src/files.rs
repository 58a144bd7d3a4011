// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File naming rules shared by intake, emission and archival.

const JSON_SUFFIX: &str = ".json";
const JOB_SUFFIX: &str = ".job";
const RESULT_SUFFIX: &str = ".result.json";
const PROPOSAL_PREFIX: &str = "proposal_";

/// Whether a file name qualifies as a job: `*.json` (any case), not hidden,
/// and not one of our own result files.
pub fn is_job_file_name(name: &str) -> bool {
    !name.starts_with('.')
        && strip_suffix_ignore_case(name, JSON_SUFFIX).is_some_and(|stem| !stem.is_empty())
        && strip_suffix_ignore_case(name, RESULT_SUFFIX).is_none()
}

/// Proposals written by the orchestrator's planning turns.
pub fn is_proposal_file_name(name: &str) -> bool {
    name.starts_with(PROPOSAL_PREFIX) && is_job_file_name(name)
}

/// Job id carried in a proposal file name: `proposal_7.json` is job `7`.
pub fn proposal_job_id(name: &str) -> Option<&str> {
    if !is_proposal_file_name(name) {
        return None;
    }
    let rest = name.strip_prefix(PROPOSAL_PREFIX)?;
    strip_suffix_ignore_case(rest, JSON_SUFFIX).filter(|id| !id.is_empty())
}

/// `<stem>.result.json`, with a trailing `.job.json` or `.json` replaced.
pub fn result_file_name(job_file_name: &str) -> String {
    let stem = strip_suffix_ignore_case(job_file_name, JSON_SUFFIX)
        .map(|s| strip_suffix_ignore_case(s, JOB_SUFFIX).unwrap_or(s))
        .unwrap_or(job_file_name);
    format!("{stem}{RESULT_SUFFIX}")
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> Option<&'a str> {
    let split = s.len().checked_sub(suffix.len())?;
    if !s.is_char_boundary(split) {
        return None;
    }
    let (head, tail) = s.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(head)
}

#[cfg(test)]
#[path = "files_tests.rs"]
mod tests;
