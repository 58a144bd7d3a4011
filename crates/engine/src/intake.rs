// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job intake: directory watcher, per-path debounce and the settled FIFO.
//!
//! ```text
//!   notify callback ─┐
//!                    ├─> raw channel ─> debouncer task ─> FIFO ─> worker
//!   startup scan ────┘                 (DelayQueue)
//! ```
//!
//! Every observation of a path starts or restarts its timer. A path reaches
//! the FIFO once it has been quiet for the whole window, so a producer that
//! rewrites a file several times yields one dequeue.

use jr_core::{is_job_file_name, proposal_job_id, Clock, EventKind, JobId, TraceId, Zone};
use jr_storage::Ledger;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use serde_json::json;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::time::{delay_queue, DelayQueue};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("intake directory {} unavailable: {source}", dir.display())]
    Dir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to watch {}: {source}", dir.display())]
    Watch {
        dir: PathBuf,
        #[source]
        source: notify::Error,
    },
}

#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub dir: PathBuf,
    pub debounce: Duration,
}

impl IntakeConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), debounce: DEFAULT_DEBOUNCE }
    }
}

/// Whether a path names a file intake should pick up.
pub fn qualifies(path: &Path) -> bool {
    path.file_name().and_then(|n| n.to_str()).is_some_and(is_job_file_name)
}

/// A running intake. Dropping it stops the watcher; the debouncer stops on
/// cancellation.
pub struct Intake {
    dir: PathBuf,
    raw: mpsc::UnboundedSender<PathBuf>,
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl Intake {
    /// Start watching `config.dir`, then seed the debouncer with every job
    /// already present. Settled paths are sent to `queue`.
    ///
    /// The watch is installed before the scan so a file created in between
    /// is seen at least once; the shared debounce collapses the overlap.
    pub fn start<C: Clock>(
        config: IntakeConfig,
        ledger: Arc<Ledger<C>>,
        queue: mpsc::UnboundedSender<PathBuf>,
        cancel: CancellationToken,
    ) -> Result<Self, IntakeError> {
        let dir = config
            .dir
            .canonicalize()
            .map_err(|source| IntakeError::Dir { dir: config.dir.clone(), source })?;

        let (raw, raw_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(debounce_loop(
            Debouncer::new(config.debounce),
            raw_rx,
            queue,
            ledger,
            cancel,
        ));

        let watcher = watch(&dir, raw.clone())?;
        let seeded = scan(&dir, &raw)?;
        tracing::info!(
            dir = %dir.display(),
            seeded,
            debounce_ms = config.debounce.as_millis() as u64,
            "intake started"
        );

        Ok(Self { dir, raw, _watcher: watcher, task })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Feed a path into the debouncer as if the watcher had reported it.
    pub fn observe(&self, path: PathBuf) {
        if qualifies(&path) {
            let _ = self.raw.send(path);
        }
    }

    /// Stop watching and wait for the debouncer to exit.
    pub async fn stopped(self) {
        let Self { task, _watcher: watcher, raw, .. } = self;
        drop(watcher);
        drop(raw);
        if let Err(e) = task.await {
            tracing::error!(error = %e, "intake debouncer failed");
        }
    }
}

fn watch(dir: &Path, raw: mpsc::UnboundedSender<PathBuf>) -> Result<RecommendedWatcher, IntakeError> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "intake watcher error");
                return;
            }
        };
        if !matches!(event.kind, notify::EventKind::Create(_) | notify::EventKind::Modify(_)) {
            return;
        }
        for path in event.paths {
            if qualifies(&path) {
                let _ = raw.send(path);
            }
        }
    })
    .map_err(|source| IntakeError::Watch { dir: dir.to_path_buf(), source })?;

    watcher
        .watch(dir, RecursiveMode::NonRecursive)
        .map_err(|source| IntakeError::Watch { dir: dir.to_path_buf(), source })?;
    Ok(watcher)
}

/// Send every qualifying file in `dir`, in name order. Returns how many.
fn scan(dir: &Path, raw: &mpsc::UnboundedSender<PathBuf>) -> Result<usize, IntakeError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|source| IntakeError::Dir { dir: dir.to_path_buf(), source })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
        .map(|entry| entry.path())
        .filter(|path| qualifies(path))
        .collect();
    paths.sort();
    let count = paths.len();
    for path in paths {
        let _ = raw.send(path);
    }
    Ok(count)
}

/// Per-path quiet timers.
pub(crate) struct Debouncer {
    window: Duration,
    timers: DelayQueue<PathBuf>,
    keys: HashMap<PathBuf, delay_queue::Key>,
}

impl Debouncer {
    pub(crate) fn new(window: Duration) -> Self {
        Self { window, timers: DelayQueue::new(), keys: HashMap::new() }
    }

    /// Start the path's timer, or restart it if one is already running.
    pub(crate) fn observe(&mut self, path: PathBuf) {
        match self.keys.get(&path) {
            Some(key) => self.timers.reset(key, self.window),
            None => {
                let key = self.timers.insert(path.clone(), self.window);
                self.keys.insert(path, key);
            }
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Wait for the next path to go quiet. `None` when no timer is running.
    pub(crate) async fn settled(&mut self) -> Option<PathBuf> {
        let expired = std::future::poll_fn(|cx| self.timers.poll_expired(cx)).await?;
        let path = expired.into_inner();
        self.keys.remove(&path);
        Some(path)
    }
}

async fn debounce_loop<C: Clock>(
    mut debouncer: Debouncer,
    mut raw: mpsc::UnboundedReceiver<PathBuf>,
    queue: mpsc::UnboundedSender<PathBuf>,
    ledger: Arc<Ledger<C>>,
    cancel: CancellationToken,
) {
    let mut open = true;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            received = raw.recv(), if open => match received {
                Some(path) => debouncer.observe(path),
                None => open = false,
            },
            Some(path) = debouncer.settled(), if !debouncer.is_empty() => {
                if let Some(id) = proposal_id(&path) {
                    record_proposal(&ledger, &path, id);
                }
                tracing::debug!(path = %path.display(), "job settled");
                if queue.send(path).is_err() {
                    tracing::debug!("job queue closed, stopping intake");
                    break;
                }
            }
        }
        if !open && debouncer.is_empty() {
            break;
        }
    }
}

/// Producer recorded on `PROPOSAL_WRITTEN` entries.
const PROPOSAL_AUTHOR: &str = "gemini";

fn proposal_id(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str()).and_then(proposal_job_id)
}

fn record_proposal<C: Clock>(ledger: &Ledger<C>, path: &Path, id: &str) {
    let job_id = JobId::new(id);
    tracing::info!(job_id = %job_id, "proposal observed");
    ledger.record(
        EventKind::ProposalWritten,
        &job_id,
        &TraceId::from(&job_id),
        Zone::Narrative,
        Some(path),
        json!({"actor": PROPOSAL_AUTHOR}),
    );
}

#[cfg(test)]
#[path = "intake_tests.rs"]
mod tests;
