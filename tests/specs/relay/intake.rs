// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Intake specs
//!
//! Verify that every job file is dispatched exactly once, whether it was
//! present at startup or arrived while the relay was running.

use crate::prelude::*;

#[tokio::test]
async fn job_present_at_startup_is_processed_once() {
    let mut relay = Relayed::new();
    let path = relay.write_job("early.json", &llm_call_doc("early", "hello"));
    relay.start(1).await;
    relay.observe(&path);

    let result = relay.result_for("early.json").await;
    settle().await;

    assert_eq!(result["job_id"], json!("early"));
    assert_eq!(relay.connector.calls().len(), 1);
    assert_eq!(relay.count(EventKind::ResultWritten), 1);
    assert!(!path.exists());

    relay.stop().await;
}

#[tokio::test]
async fn rapid_rewrites_dispatch_once_with_final_content() {
    let mut relay = Relayed::new();
    relay.start(1).await;

    for i in 0..5 {
        relay.write_job("busy.json", &llm_call_doc("busy", &format!("draft-{i}")));
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    relay.result_for("busy.json").await;
    settle().await;

    let calls = relay.connector.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].prompt.contains("draft-4"));

    relay.stop().await;
}

#[tokio::test]
async fn unsupported_kind_stays_in_intake() {
    let mut relay = Relayed::new();
    relay.start(1).await;

    let path = relay.write_job("odd.json", &legacy_doc("odd", "shell_exec", json!({})));
    wait_until(|| relay.count(EventKind::JobSkipped) == 1).await;

    let skipped = relay.entries().into_iter().find(|e| e.event == EventKind::JobSkipped).unwrap();
    assert_eq!(skipped.zone, Zone::Intake);
    assert_eq!(skipped.job_id.as_str(), "odd");
    assert_eq!(skipped.meta["reason"], json!("unsupported_kind"));

    assert!(path.exists());
    assert!(!relay.paths.results.join("odd.result.json").exists());
    assert!(relay.connector.calls().is_empty());

    relay.stop().await;
}

#[tokio::test]
async fn malformed_file_is_left_alone_and_later_jobs_proceed() {
    let mut relay = Relayed::new();
    relay.start(1).await;

    let broken = relay.write_raw("broken.json", "{not json");
    settle().await;
    relay.write_job("after.json", &llm_call_doc("after", "still working"));
    let result = relay.result_for("after.json").await;

    assert_eq!(result["ok"], json!(true));
    assert!(broken.exists());
    assert!(!relay.paths.results.join("broken.result.json").exists());
    assert!(relay.entries().iter().all(|e| e.job_id.as_str() == "after"));

    relay.stop().await;
}

#[tokio::test]
async fn proposal_file_is_ledgered_then_processed() {
    let mut relay = Relayed::new();
    relay.start(1).await;

    let doc = envelope_doc("proposal_7", "analyze_file", json!({"path": "src/lib.rs"}));
    relay.write_job("proposal_7.json", &doc);
    let result = relay.result_for("proposal_7.json").await;

    assert_eq!(result["ok"], json!(true));
    let proposal =
        relay.entries().into_iter().find(|e| e.event == EventKind::ProposalWritten).unwrap();
    assert_eq!(proposal.zone, Zone::Narrative);
    assert_eq!(proposal.job_id.as_str(), "7");
    assert_eq!(proposal.meta["actor"], json!("gemini"));
    assert_eq!(proposal.artifact.unwrap().path, "in/proposal_7.json");

    relay.stop().await;
}

#[tokio::test]
async fn legacy_and_envelope_documents_are_both_relayed() {
    let mut relay = Relayed::new();
    relay.start(1).await;

    relay.write_job(
        "legacy-1.json",
        &legacy_doc("legacy-1", "analyze_file", json!({"params": {"path": "README.md"}})),
    );
    relay.write_job("env-1.json", &envelope_doc("env-1", "llm_call", json!({"prompt": "hi"})));

    let legacy = relay.result_for("legacy-1.json").await;
    let envelope = relay.result_for("env-1.json").await;

    assert_eq!(legacy["job_id"], json!("legacy-1"));
    assert_eq!(legacy["ok"], json!(true));
    assert_eq!(envelope["job_id"], json!("env-1"));
    assert_eq!(envelope["refs"]["trace_id"], json!("trace-env-1"));
    assert_eq!(relay.connector.calls().len(), 2);

    relay.stop().await;
}
