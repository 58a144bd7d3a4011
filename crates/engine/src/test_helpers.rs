// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture for engine unit tests.

use crate::emit::Emitter;
use crate::relay::{Relay, RelayConfig};
use jr_adapters::{Endpoint, FakeConnector, PoolConfig, SessionPool};
use jr_core::{EventKind, FakeClock, LedgerEntry};
use jr_storage::{Archiver, Ledger, RelayPaths, ResultWriter};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub(crate) struct Fixture {
    _dir: TempDir,
    pub paths: RelayPaths,
    pub clock: FakeClock,
    pub ledger: Arc<Ledger<FakeClock>>,
    pub connector: FakeConnector,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let paths = RelayPaths::new(dir.path().canonicalize().unwrap());
        paths.ensure_dirs().unwrap();
        let clock = FakeClock::new();
        let ledger = Arc::new(Ledger::new(&paths.ledger, &paths.root, clock.clone()));
        Self { _dir: dir, paths, clock, ledger, connector: FakeConnector::new() }
    }

    pub fn emitter(&self) -> Emitter<FakeClock> {
        Emitter::new(
            ResultWriter::new(&self.paths.results),
            Archiver::new(&self.paths.archive),
            Arc::clone(&self.ledger),
        )
    }

    /// A relay over an initialized pool of `browser-1..=n`.
    pub async fn relay(&self, sessions: usize) -> Arc<Relay<FakeConnector, FakeClock>> {
        let urls: Vec<String> = (1..=sessions).map(|i| format!("http://127.0.0.1:{}", 9221 + i)).collect();
        let pool = SessionPool::new(self.connector.clone(), Endpoint::numbered(urls), PoolConfig::default());
        if sessions > 0 {
            pool.initialize().await.unwrap();
        }
        Arc::new(Relay::new(
            pool,
            self.emitter(),
            Arc::clone(&self.ledger),
            self.clock.clone(),
            RelayConfig::default(),
        ))
    }

    pub fn write_job(&self, name: &str, doc: &Value) -> PathBuf {
        let path = self.paths.intake.join(name);
        std::fs::write(&path, doc.to_string()).unwrap();
        path
    }

    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.ledger.entries().unwrap()
    }

    pub fn events(&self) -> Vec<EventKind> {
        self.entries().into_iter().map(|e| e.event).collect()
    }

    pub fn read_json(path: &std::path::Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }
}
