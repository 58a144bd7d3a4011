// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single worker draining the intake FIFO.

use crate::relay::{JobOutcome, Relay};
use jr_adapters::SessionConnector;
use jr_core::Clock;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Spawn the worker loop.
///
/// Jobs run one at a time in settle order. Each runs on its own task so a
/// panic ends that job only. Cancellation is observed between jobs; the
/// job in flight always finishes.
pub fn spawn_worker<S, C>(
    relay: Arc<Relay<S, C>>,
    mut queue: mpsc::UnboundedReceiver<PathBuf>,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    S: SessionConnector,
    C: Clock,
{
    tokio::spawn(async move {
        tracing::info!("worker started");
        loop {
            let path = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = queue.recv() => match next {
                    Some(path) => path,
                    None => break,
                },
            };
            run_one(&relay, path).await;
        }
        tracing::info!("worker stopped");
    })
}

async fn run_one<S: SessionConnector, C: Clock>(relay: &Arc<Relay<S, C>>, path: PathBuf) {
    let relay = Arc::clone(relay);
    let task_path = path.clone();
    let handle = tokio::spawn(async move { relay.process(&task_path).await });

    match handle.await {
        Ok(Ok(JobOutcome::Completed { job_id, ok, .. })) => {
            tracing::debug!(job_id = %job_id, ok, "job done");
        }
        Ok(Ok(JobOutcome::Skipped { .. } | JobOutcome::Vanished)) => {}
        Ok(Err(e)) => tracing::warn!(error = %e, "job dropped"),
        Err(e) if e.is_panic() => {
            tracing::error!(path = %path.display(), "job processing panicked");
        }
        Err(e) => tracing::error!(path = %path.display(), error = %e, "job task failed"),
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
