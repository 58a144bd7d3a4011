// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator ("core") HTTP surface used by the relay: worker
//! registration, heartbeats and exception reports.

use async_trait::async_trait;
use jr_core::{CapabilitySet, WorkerId};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub const REGISTER_PATH: &str = "/api/mesh/workers/register";
pub const HEARTBEAT_PATH: &str = "/api/system/heartbeat";
pub const EXCEPTION_PATH: &str = "/api/system/exception";

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("{path}: {source}")]
    Http {
        path: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path}: HTTP {status}")]
    Status { path: &'static str, status: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationMeta {
    pub llm_backend: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub worker_id: WorkerId,
    pub capabilities: CapabilitySet,
    pub status: &'static str,
    /// Address the orchestrator can reach this worker at.
    pub endpoint: String,
    pub meta: RegistrationMeta,
}

impl Registration {
    pub fn online(
        worker_id: WorkerId,
        capabilities: CapabilitySet,
        endpoint: impl Into<String>,
        meta: RegistrationMeta,
    ) -> Self {
        Self { worker_id, capabilities, status: "online", endpoint: endpoint.into(), meta }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heartbeat {
    pub service: String,
    pub file_location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct ExceptionReport<'a> {
    service: &'a str,
    exception: &'a str,
}

/// Adapter for the orchestrator endpoints.
#[async_trait]
pub trait Orchestrator: Clone + Send + Sync + 'static {
    async fn register(&self, registration: &Registration) -> Result<(), OrchestratorError>;
    async fn heartbeat(&self, heartbeat: &Heartbeat) -> Result<(), OrchestratorError>;
    async fn report_exception(&self, service: &str, exception: &str) -> Result<(), OrchestratorError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub base_url: String,
    pub register_timeout: Duration,
    pub heartbeat_timeout: Duration,
}

impl OrchestratorConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            register_timeout: Duration::from_secs(5),
            heartbeat_timeout: Duration::from_secs(2),
        }
    }
}

/// JSON-over-HTTP orchestrator client.
#[derive(Clone)]
pub struct HttpOrchestrator {
    http: reqwest::Client,
    config: OrchestratorConfig,
}

impl HttpOrchestrator {
    pub fn new(config: OrchestratorConfig) -> Self {
        Self { http: reqwest::Client::new(), config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn post<T: Serialize + Sync>(
        &self,
        path: &'static str,
        body: &T,
        timeout: Duration,
    ) -> Result<(), OrchestratorError> {
        let response = self
            .http
            .post(self.url(path))
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|source| OrchestratorError::Http { path, source })?;
        let status = response.status();
        if !status.is_success() {
            return Err(OrchestratorError::Status { path, status: status.as_u16() });
        }
        Ok(())
    }
}

#[async_trait]
impl Orchestrator for HttpOrchestrator {
    async fn register(&self, registration: &Registration) -> Result<(), OrchestratorError> {
        self.post(REGISTER_PATH, registration, self.config.register_timeout).await
    }

    async fn heartbeat(&self, heartbeat: &Heartbeat) -> Result<(), OrchestratorError> {
        self.post(HEARTBEAT_PATH, heartbeat, self.config.heartbeat_timeout).await
    }

    async fn report_exception(&self, service: &str, exception: &str) -> Result<(), OrchestratorError> {
        let report = ExceptionReport { service, exception };
        self.post(EXCEPTION_PATH, &report, self.config.heartbeat_timeout).await
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{Heartbeat, Orchestrator, OrchestratorError, Registration};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded orchestrator request.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum OrchestratorCall {
        Register(Registration),
        Heartbeat(Heartbeat),
        Exception { service: String, exception: String },
    }

    #[derive(Default)]
    struct FakeOrchestratorState {
        calls: Vec<OrchestratorCall>,
        register_failures: usize,
        heartbeat_failures: usize,
    }

    /// Fake orchestrator for testing
    #[derive(Clone, Default)]
    pub struct FakeOrchestrator {
        inner: Arc<Mutex<FakeOrchestratorState>>,
    }

    impl FakeOrchestrator {
        pub fn new() -> Self {
            Self::default()
        }

        /// The next `n` registrations fail.
        pub fn fail_registrations(&self, n: usize) {
            self.inner.lock().register_failures = n;
        }

        /// The next `n` heartbeats fail.
        pub fn fail_heartbeats(&self, n: usize) {
            self.inner.lock().heartbeat_failures = n;
        }

        pub fn calls(&self) -> Vec<OrchestratorCall> {
            self.inner.lock().calls.clone()
        }
    }

    fn take_failure(counter: &mut usize, path: &'static str) -> Result<(), OrchestratorError> {
        if *counter > 0 {
            *counter -= 1;
            return Err(OrchestratorError::Status { path, status: 503 });
        }
        Ok(())
    }

    #[async_trait]
    impl Orchestrator for FakeOrchestrator {
        async fn register(&self, registration: &Registration) -> Result<(), OrchestratorError> {
            let mut inner = self.inner.lock();
            inner.calls.push(OrchestratorCall::Register(registration.clone()));
            take_failure(&mut inner.register_failures, super::REGISTER_PATH)
        }

        async fn heartbeat(&self, heartbeat: &Heartbeat) -> Result<(), OrchestratorError> {
            let mut inner = self.inner.lock();
            inner.calls.push(OrchestratorCall::Heartbeat(heartbeat.clone()));
            take_failure(&mut inner.heartbeat_failures, super::HEARTBEAT_PATH)
        }

        async fn report_exception(
            &self,
            service: &str,
            exception: &str,
        ) -> Result<(), OrchestratorError> {
            self.inner.lock().calls.push(OrchestratorCall::Exception {
                service: service.to_string(),
                exception: exception.to_string(),
            });
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeOrchestrator, OrchestratorCall};

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
