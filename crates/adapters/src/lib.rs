// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Adapters for the systems the relay talks to: model front-end sessions
//! and the orchestrator.

pub mod orchestrator;
pub mod pool;
pub mod session;

pub use orchestrator::{
    Heartbeat, HttpOrchestrator, Orchestrator, OrchestratorConfig, OrchestratorError,
    Registration, RegistrationMeta,
};
pub use pool::{Dispatched, PoolConfig, PoolError, PoolStatus, SessionPool, SessionState, SessionStatus};
pub use session::{
    BackendReply, CdpConfig, CdpConnector, Endpoint, Session, SessionConnector, SessionError,
    DEFAULT_BRIDGE,
};

#[cfg(any(test, feature = "test-support"))]
pub use orchestrator::{FakeOrchestrator, OrchestratorCall};
#[cfg(any(test, feature = "test-support"))]
pub use session::{FakeCall, FakeConnector};
