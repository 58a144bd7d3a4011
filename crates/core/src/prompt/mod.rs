// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt builder.
//!
//! Template selection is a priority-ordered rule table; the first rule whose
//! predicate holds renders the prompt. The builder is pure: identical inputs
//! always yield byte-identical prompts.

mod context;

pub use context::{
    ContextBlock, Section, SectionKind, ARTIFACT_PREVIEW_ITEMS, ARTIFACT_SUMMARY_LIMIT,
    DATA_DUMP_LIMIT, LATEST_RESULT_LIMIT, LIST_FILES_LIMIT, READ_CONTENT_LIMIT,
};

use crate::artifact::ArtifactSet;
use crate::job::Job;
use crate::normalize::JobViews;
use crate::value::{display_value, empty_object, lookup, pretty};
use context::text_at;

/// Directive prepended to every JSON-producing template.
pub const LCP_PREAMBLE: &str = "You may decide which task is worth doing next.
Protocol: LCP (JSON ONLY). No prose. No markdown fences.
PROPOSAL Structure: { \"ok\": true, \"action\": \"create_followup_jobs\", \"thought\": \"...\", \"new_jobs\": [] }
RESOLUTION Structure: { \"ok\": true, \"action\": \"analysis_result\", \"answer\": \"...\" }
End response with '}' ONLY.";

/// Which template rendered a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Interactive,
    Planning,
    SelfLoop,
    Fallback,
}

crate::str_enum! {
    Template {
        Interactive => "interactive",
        Planning => "planning",
        SelfLoop => "self_loop",
        Fallback => "fallback",
    }
}

/// Everything a template may read.
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub job: &'a Job,
    pub views: &'a JobViews,
    pub artifacts: &'a ArtifactSet,
}

struct Rule {
    template: Template,
    applies: fn(&PromptInput<'_>) -> bool,
    render: fn(&PromptInput<'_>, &str) -> String,
}

const RULES: &[Rule] = &[
    Rule { template: Template::Interactive, applies: is_interactive, render: interactive },
    Rule { template: Template::Planning, applies: is_planning, render: planning },
    Rule { template: Template::SelfLoop, applies: is_self_loop, render: self_loop },
    Rule { template: Template::Fallback, applies: always, render: fallback },
];

/// A rendered prompt and the template that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub template: Template,
    pub text: String,
}

/// Build the prompt for a normalized job.
pub fn build_prompt(job: &Job, views: &JobViews, artifacts: &ArtifactSet) -> Prompt {
    let input = PromptInput { job, views, artifacts };
    let context = ContextBlock::build(views, artifacts).render();
    match RULES.iter().find(|rule| (rule.applies)(&input)) {
        Some(rule) => Prompt { template: rule.template, text: (rule.render)(&input, &context) },
        None => Prompt { template: Template::Fallback, text: fallback(&input, &context) },
    }
}

/// The template [`build_prompt`] would choose, without rendering.
pub fn select_template(job: &Job, views: &JobViews, artifacts: &ArtifactSet) -> Template {
    let input = PromptInput { job, views, artifacts };
    RULES
        .iter()
        .find(|rule| (rule.applies)(&input))
        .map(|rule| rule.template)
        .unwrap_or(Template::Fallback)
}

fn always(_: &PromptInput<'_>) -> bool {
    true
}

fn is_interactive(input: &PromptInput<'_>) -> bool {
    lookup(&input.views.params, &["prompt"]).is_some()
        && matches!(input.job.kind(), "llm_call" | "webrelay")
}

fn is_planning(input: &PromptInput<'_>) -> bool {
    let payload = &input.views.payload;
    input.job.kind() == "agent_plan"
        || (lookup(payload, &["task"]).is_some() && lookup(payload, &["mission"]).is_some())
        || input.job.is_envelope()
}

fn is_self_loop(input: &PromptInput<'_>) -> bool {
    matches!(input.job.kind(), "self_loop" | "sheratan_selfloop")
}

fn interactive(input: &PromptInput<'_>, context: &str) -> String {
    let payload = &input.views.payload;
    let mission = text_at(payload, &["task", "description"]).unwrap_or_else(|| "System Audit".into());
    let name = text_at(payload, &["task", "name"]).unwrap_or_else(|| input.job.kind().to_string());
    let request = text_at(&input.views.params, &["prompt"]).unwrap_or_default();
    format!(
        "{LCP_PREAMBLE}\n\nMISSION: {mission}\nCONTEXT: {name}\n{context}\nREQUEST: {request}\n\nPROPOSAL (JSON ONLY):"
    )
}

fn planning(input: &PromptInput<'_>, context: &str) -> String {
    let params = &input.views.params;
    let payload = &input.views.payload;
    let mission = [
        text_at(params, &["user_prompt"]),
        text_at(params, &["user_request"]),
        text_at(params, &["prompt"]),
        text_at(params, &["input", "user_request"]),
        text_at(payload, &["task", "description"]),
        text_at(payload, &["mission", "description"]),
    ]
    .into_iter()
    .flatten()
    .next()
    .unwrap_or_else(|| "Plan mission".into());
    format!("{LCP_PREAMBLE}\n\nMISSION: {mission}\n{context}\nGENERATE LCP PROPOSAL (JSON ONLY):")
}

fn self_loop(input: &PromptInput<'_>, context: &str) -> String {
    let payload = &input.views.payload;
    let title = text_at(payload, &["mission", "title"]).unwrap_or_default();
    let task = text_at(payload, &["task", "name"]).unwrap_or_default();
    let state = lookup(payload, &["state"]).cloned().unwrap_or_else(empty_object);
    format!(
        "Self-Loop (Final Report Phase)\n\nMission: {title}\nTask: {task}\n{context}\nCurrent Loop State:\n{}\n\n\
         Provide a concise status report in Markdown with four sections (A/B/C/D). No JSON.",
        pretty(&state)
    )
}

fn fallback(input: &PromptInput<'_>, context: &str) -> String {
    let request = lookup(&input.views.params, &["prompt"])
        .map(display_value)
        .unwrap_or_else(|| pretty(input.job.document()));
    format!("{LCP_PREAMBLE}\n\n{context}\nREQUEST:\n{request}\n\nRESPOND NOW WITH JSON ONLY:")
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
