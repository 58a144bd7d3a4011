// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relay lifecycle: startup, run until signalled, shutdown.

use crate::config::Config;
use crate::reporter::Reporter;
use fs2::FileExt;
use jr_adapters::{
    CdpConnector, HttpOrchestrator, Orchestrator, PoolError, Registration, RegistrationMeta,
    SessionConnector, SessionPool,
};
use jr_core::SystemClock;
use jr_engine::{Emitter, IntakeError, Pipeline, Relay};
use jr_storage::{Archiver, Ledger, RelayPaths, ResultWriter, StoreError};
use std::fs::File;
use std::io::Write;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to acquire lock: relay already running?")]
    LockFailed(#[source] std::io::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("session pool unavailable: {0}")]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A started relay.
pub struct Relayd<S: SessionConnector> {
    paths: RelayPaths,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    lock_file: File,
    pool: SessionPool<S>,
    pipeline: Pipeline,
    probe: JoinHandle<()>,
    reporter: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Start the relay.
pub async fn startup<S, O>(
    config: &Config,
    connector: S,
    orchestrator: O,
) -> Result<Relayd<S>, LifecycleError>
where
    S: SessionConnector,
    O: Orchestrator,
{
    let paths = config.paths();
    paths.ensure_dirs()?;
    let paths = paths.canonicalized()?;
    match startup_inner(config, &paths, connector, orchestrator).await {
        Ok(relayd) => Ok(relayd),
        Err(e) => {
            // The lock file belongs to the relay that holds it
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(&paths);
            }
            Err(e)
        }
    }
}

async fn startup_inner<S, O>(
    config: &Config,
    paths: &RelayPaths,
    connector: S,
    orchestrator: O,
) -> Result<Relayd<S>, LifecycleError>
where
    S: SessionConnector,
    O: Orchestrator,
{
    // 1. The lock before anything else touches the layout
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&paths.lock)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 2. Sessions; none connected is fatal
    let pool = SessionPool::new(connector, config.endpoints(), config.pool_config());
    pool.initialize().await?;

    let cancel = CancellationToken::new();
    let probe = pool.spawn_health_probe(pool.config().health_interval, cancel.child_token());

    // 3. Processing pipeline
    let clock = SystemClock;
    let ledger = Arc::new(Ledger::new(&paths.ledger, &paths.root, clock.clone()));
    let emitter = Emitter::new(
        ResultWriter::new(&paths.results),
        Archiver::new(&paths.archive),
        Arc::clone(&ledger),
    );
    let relay_config = config.relay_config();
    let registration = Registration::online(
        relay_config.worker_id.clone(),
        relay_config.capabilities.clone(),
        config.orchestrator.endpoint.as_str(),
        RegistrationMeta {
            llm_backend: relay_config.llm_backend.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    );
    let relay = Arc::new(Relay::new(pool.clone(), emitter, Arc::clone(&ledger), clock, relay_config));
    let pipeline = match Pipeline::start(
        relay,
        config.intake_config(paths),
        ledger,
        cancel.child_token(),
    ) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            cancel.cancel();
            pool.shutdown().await;
            return Err(e.into());
        }
    };

    // 4. Orchestrator reporting
    let reporter = Reporter::new(orchestrator, registration)
        .spawn(config.heartbeat_interval(), cancel.child_token());

    tracing::info!(
        root = %paths.root.display(),
        intake = %paths.intake.display(),
        sessions = pool.status().available,
        "relay started"
    );

    Ok(Relayd {
        paths: paths.clone(),
        lock_file,
        pool,
        pipeline,
        probe,
        reporter,
        cancel,
    })
}

/// Remove the PID file after a failed startup.
fn cleanup_on_failure(paths: &RelayPaths) {
    if let Err(e) = std::fs::remove_file(&paths.lock) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %paths.lock.display(), error = %e, "failed to remove lock file");
        }
    }
}

impl<S: SessionConnector> Relayd<S> {
    pub fn paths(&self) -> &RelayPaths {
        &self.paths
    }

    pub fn pool(&self) -> &SessionPool<S> {
        &self.pool
    }

    /// Stop all tasks, let the job in flight finish, close sessions and
    /// release the lock.
    pub async fn shutdown(self) {
        tracing::info!("shutting down relay");
        self.cancel.cancel();
        self.pipeline.join().await;
        for (task, name) in [(self.reporter, "reporter"), (self.probe, "health probe")] {
            if let Err(e) = task.await {
                tracing::warn!(task = name, error = %e, "task ended abnormally");
            }
        }
        self.pool.shutdown().await;

        drop(self.lock_file);
        if let Err(e) = std::fs::remove_file(&self.paths.lock) {
            tracing::warn!(error = %e, "failed to remove lock file");
        }
        tracing::info!("relay stopped");
    }
}

/// Run the production relay until Ctrl-C or SIGTERM.
pub async fn run(config: Config) -> Result<(), LifecycleError> {
    let connector = CdpConnector::new(config.cdp_config());
    let orchestrator = HttpOrchestrator::new(config.orchestrator_config());
    let relayd = startup(&config, connector, orchestrator).await?;

    shutdown_signal().await;
    relayd.shutdown().await;
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "SIGTERM handler unavailable");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
