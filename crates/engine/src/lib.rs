// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! The relay engine: intake, the worker loop and per-job processing.

mod emit;
mod intake;
mod relay;
mod worker;

#[cfg(test)]
mod test_helpers;

pub use emit::{Emission, Emitter};
pub use intake::{qualifies, Intake, IntakeConfig, IntakeError, DEFAULT_DEBOUNCE};
pub use relay::{JobOutcome, Relay, RelayConfig, RelayError, DEFAULT_LLM_BACKEND, DEFAULT_WORKER_ID};
pub use worker::spawn_worker;

use jr_adapters::SessionConnector;
use jr_core::Clock;
use jr_storage::Ledger;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Intake wired to a worker through the FIFO.
pub struct Pipeline {
    intake: Intake,
    worker: JoinHandle<()>,
}

impl Pipeline {
    /// Start the worker, then the intake feeding it.
    pub fn start<S, C>(
        relay: Arc<Relay<S, C>>,
        intake: IntakeConfig,
        ledger: Arc<Ledger<C>>,
        cancel: CancellationToken,
    ) -> Result<Self, IntakeError>
    where
        S: SessionConnector,
        C: Clock,
    {
        let (queue, queue_rx) = mpsc::unbounded_channel();
        let worker = spawn_worker(relay, queue_rx, cancel.clone());
        let intake = match Intake::start(intake, ledger, queue, cancel.clone()) {
            Ok(intake) => intake,
            Err(e) => {
                worker.abort();
                return Err(e);
            }
        };
        Ok(Self { intake, worker })
    }

    pub fn intake(&self) -> &Intake {
        &self.intake
    }

    /// Stop watching and wait for both tasks. Without cancellation, paths
    /// already observed still settle and are processed first.
    pub async fn join(self) {
        self.intake.stopped().await;
        if let Err(e) = self.worker.await {
            tracing::error!(error = %e, "worker task failed");
        }
    }
}
