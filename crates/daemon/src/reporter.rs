// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Registration and heartbeat reporting to the orchestrator.

use jr_adapters::{Heartbeat, Orchestrator, Registration};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Service name used for heartbeats and exception reports.
pub const SERVICE: &str = "webrelay";
/// Reported as the heartbeat's `file_location`.
pub const FILE_LOCATION: &str = "jrelayd";

/// One reporter per relay. Registers until the orchestrator accepts it,
/// then only heartbeats.
pub struct Reporter<O: Orchestrator> {
    orchestrator: O,
    registration: Registration,
    heartbeat: Heartbeat,
    registered: bool,
}

impl<O: Orchestrator> Reporter<O> {
    pub fn new(orchestrator: O, registration: Registration) -> Self {
        Self {
            orchestrator,
            registration,
            heartbeat: Heartbeat {
                service: SERVICE.to_string(),
                file_location: FILE_LOCATION.to_string(),
            },
            registered: false,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// One reporting round: register if still needed, then heartbeat.
    pub async fn tick(&mut self) {
        if !self.registered {
            match self.orchestrator.register(&self.registration).await {
                Ok(()) => {
                    tracing::info!(worker_id = %self.registration.worker_id, "registered with orchestrator");
                    self.registered = true;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "registration failed, retrying next tick");
                }
            }
        }

        if let Err(e) = self.orchestrator.heartbeat(&self.heartbeat).await {
            tracing::warn!(error = %e, "heartbeat failed");
            let exception = format!("Heartbeat ping failed: {e}");
            if let Err(e) = self.orchestrator.report_exception(SERVICE, &exception).await {
                tracing::debug!(error = %e, "exception report failed");
            }
        }
    }

    /// Tick immediately, then every `interval` until cancelled.
    pub fn spawn(mut self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => self.tick().await,
                }
            }
            tracing::debug!("reporter stopped");
        })
    }
}

#[cfg(test)]
#[path = "reporter_tests.rs"]
mod tests;
