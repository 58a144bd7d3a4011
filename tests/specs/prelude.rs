// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for relay scenarios.

pub use jr_adapters::FakeConnector;
pub use jr_core::test_support::{
    envelope_doc, lcp_answer_reply, lcp_followup_reply, legacy_doc, llm_call_doc,
};
pub use jr_core::{EventKind, LedgerEntry, Zone};
pub use serde_json::{json, Value};
pub use std::time::Duration;

use jr_adapters::{Endpoint, PoolConfig, SessionPool};
use jr_core::FakeClock;
use jr_engine::{Emitter, IntakeConfig, Pipeline, Relay, RelayConfig};
use jr_storage::{Archiver, Ledger, RelayPaths, ResultWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(10);
pub const DEBOUNCE: Duration = Duration::from_millis(150);

/// A relay root with a pipeline that can be started and stopped.
pub struct Relayed {
    _dir: TempDir,
    pub paths: RelayPaths,
    pub connector: FakeConnector,
    ledger: Arc<Ledger<FakeClock>>,
    clock: FakeClock,
    cancel: CancellationToken,
    pipeline: Option<Pipeline>,
}

impl Relayed {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let paths = RelayPaths::new(dir.path().canonicalize().unwrap());
        paths.ensure_dirs().unwrap();
        let clock = FakeClock::new();
        let ledger = Arc::new(Ledger::new(&paths.ledger, &paths.root, clock.clone()));
        Self {
            _dir: dir,
            paths,
            connector: FakeConnector::new(),
            ledger,
            clock,
            cancel: CancellationToken::new(),
            pipeline: None,
        }
    }

    /// Start intake and worker over `sessions` scripted sessions. Zero
    /// sessions leaves the pool empty, as after every endpoint was evicted.
    pub async fn start(&mut self, sessions: usize) {
        let urls: Vec<String> =
            (0..sessions).map(|i| format!("http://127.0.0.1:{}", 9222 + i)).collect();
        let pool =
            SessionPool::new(self.connector.clone(), Endpoint::numbered(urls), PoolConfig::default());
        if sessions > 0 {
            pool.initialize().await.unwrap();
        }
        let emitter = Emitter::new(
            ResultWriter::new(&self.paths.results),
            Archiver::new(&self.paths.archive),
            Arc::clone(&self.ledger),
        );
        let relay = Arc::new(Relay::new(
            pool,
            emitter,
            Arc::clone(&self.ledger),
            self.clock.clone(),
            RelayConfig::default(),
        ));
        let intake = IntakeConfig { dir: self.paths.intake.clone(), debounce: DEBOUNCE };
        let pipeline =
            Pipeline::start(relay, intake, Arc::clone(&self.ledger), self.cancel.clone()).unwrap();
        self.pipeline = Some(pipeline);
    }

    /// Report `path` to intake again, as a redundant watcher event would.
    pub fn observe(&self, path: &Path) {
        self.pipeline.as_ref().unwrap().intake().observe(path.to_path_buf());
    }

    pub fn write_job(&self, name: &str, doc: &Value) -> PathBuf {
        let path = self.paths.intake.join(name);
        std::fs::write(&path, serde_json::to_string_pretty(doc).unwrap()).unwrap();
        path
    }

    pub fn write_raw(&self, name: &str, content: &str) -> PathBuf {
        let path = self.paths.intake.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    /// Wait until the job has been archived and ledgered, then return its
    /// `<stem>.result.json`.
    pub async fn result_for(&self, job_file: &str) -> Value {
        let stem = job_file.strip_suffix(".json").unwrap_or(job_file);
        let archived = format!("archive/{job_file}");
        wait_until(|| {
            self.entries().iter().any(|e| {
                e.event == EventKind::JobArchived
                    && e.artifact.as_ref().is_some_and(|a| a.path == archived)
            })
        })
        .await;
        read_json(&self.paths.results.join(format!("{stem}.result.json")))
    }

    pub fn archived(&self, job_file: &str) -> Value {
        read_json(&self.paths.archive.join(job_file))
    }

    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.ledger.entries().unwrap()
    }

    pub fn count(&self, event: EventKind) -> usize {
        self.entries().iter().filter(|e| e.event == event).count()
    }

    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(pipeline) = self.pipeline.take() {
            pipeline.join().await;
        }
    }
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + WAIT;
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met within {WAIT:?}");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Let the debounce window pass a few times over.
pub async fn settle() {
    tokio::time::sleep(DEBOUNCE * 4).await;
}
