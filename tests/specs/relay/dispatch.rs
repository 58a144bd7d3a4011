// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch specs
//!
//! Verify what lands in the results directory, the archive and the ledger
//! for each kind of model reply.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn lcp_reply_yields_ok_envelope_with_answer() {
    let mut relay = Relayed::new();
    relay.connector.push_reply(lcp_answer_reply("Paris"));
    relay.start(1).await;

    relay.write_job("job-1.json", &llm_call_doc("job-1", "What is the capital of France?"));
    let result = relay.result_for("job-1.json").await;

    assert_eq!(result["schema_version"], json!("result_envelope_v1"));
    assert_eq!(result["job_id"], json!("job-1"));
    assert_eq!(result["ok"], json!(true));
    assert!(result.get("error").is_none());
    assert_eq!(result["result"]["data"]["type"], json!("lcp"));
    assert_eq!(result["result"]["data"]["answer"], json!("Paris"));
    assert_eq!(result["result"]["summary"], json!("Paris"));
    assert_eq!(relay.count(EventKind::ResultWritten), 1);

    let archived = relay.archived("job-1.json");
    assert_eq!(archived["status"], json!("completed"));
    assert_eq!(archived["kind"], json!("llm_call"));

    relay.stop().await;
}

#[tokio::test]
async fn no_reachable_endpoint_yields_failed_envelope() {
    let mut relay = Relayed::new();
    relay.start(0).await;

    relay.write_job("job-2.json", &llm_call_doc("job-2", "hello"));
    let result = relay.result_for("job-2.json").await;

    assert_eq!(result["ok"], json!(false));
    assert!(result.get("result").is_none());
    assert!(!result["error"].as_str().unwrap().is_empty());
    assert_eq!(relay.archived("job-2.json")["status"], json!("failed"));

    let written: Vec<LedgerEntry> =
        relay.entries().into_iter().filter(|e| e.event == EventKind::ResultWritten).collect();
    assert_eq!(written.len(), 1);
    assert_eq!(written[0].meta["ok"], json!(false));

    relay.stop().await;
}

#[tokio::test]
async fn plain_prose_yields_narrative_result() {
    let mut relay = Relayed::new();
    let prose = format!("  {}", "Plain words without any structure at all. ".repeat(30));
    relay.connector.push_reply(prose.clone());
    relay.start(1).await;

    relay.write_job("job-3.json", &llm_call_doc("job-3", "describe"));
    let result = relay.result_for("job-3.json").await;

    let data = &result["result"]["data"];
    assert_eq!(data["type"], json!("text"));
    assert_eq!(data["text"], json!(prose));
    let summary: String = prose.trim().chars().take(500).collect();
    assert_eq!(data["summary"], json!(summary));

    relay.stop().await;
}

#[tokio::test]
async fn followup_proposal_is_normalized_into_result() {
    let mut relay = Relayed::new();
    relay.connector.push_reply(lcp_followup_reply("split the work", &["read_file", "walk_tree"]));
    relay.start(1).await;

    let doc = envelope_doc("plan-1", "agent_plan", json!({"mission": "map the repo"}));
    relay.write_job("plan-1.json", &doc);
    let result = relay.result_for("plan-1.json").await;

    let data = &result["result"]["data"];
    assert_eq!(data["type"], json!("lcp"));
    assert_eq!(data["action"], json!("create_followup_jobs"));
    assert_eq!(
        data["new_jobs"],
        json!([{"kind": "read_file", "params": {}}, {"kind": "walk_tree", "params": {}}])
    );
    assert_eq!(result["result"]["summary"], json!("split the work"));
    assert_eq!(result["refs"]["trace_id"], json!("trace-plan-1"));

    relay.stop().await;
}

#[tokio::test]
async fn ledger_traces_each_step_of_a_job() {
    let mut relay = Relayed::new();
    relay.start(1).await;

    relay.write_job("job-4.json", &llm_call_doc("job-4", "hi"));
    relay.result_for("job-4.json").await;

    let entries = relay.entries();
    let steps: Vec<(EventKind, Zone, Option<String>)> = entries
        .iter()
        .map(|e| (e.event, e.zone, e.artifact.as_ref().map(|a| a.path.clone())))
        .collect();
    assert_eq!(
        steps,
        vec![
            (EventKind::ResultWritten, Zone::Output, Some("out/job-4.result.json".to_string())),
            (EventKind::JobArchived, Zone::Archive, Some("archive/job-4.json".to_string())),
        ]
    );
    for entry in &entries {
        assert_eq!(entry.actor, "webrelay");
        assert_eq!(entry.job_id.as_str(), "job-4");
        assert_eq!(entry.ts, "2026-01-01T00:00:00.000Z");
    }

    relay.stop().await;
}
