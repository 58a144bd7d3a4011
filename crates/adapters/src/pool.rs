// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session pool: round-robin dispatch over healthy sessions with periodic
//! health eviction.
//!
//! The session list lives behind a synchronous mutex that is only held for
//! reads and mutations, never across an await. Probes and calls run on
//! cloned `Arc<dyn Session>` handles.

use crate::session::{BackendReply, Endpoint, Session, SessionConnector, SessionError};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Upper bound on one prompt round trip.
    pub dispatch_timeout: Duration,
    /// Upper bound on one health probe.
    pub probe_timeout: Duration,
    pub health_interval: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            dispatch_timeout: Duration::from_secs(300),
            probe_timeout: Duration::from_secs(10),
            health_interval: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("no sessions available: none of {attempted} endpoint(s) connected")]
    NoSessions { attempted: usize },
    #[error("no endpoint available")]
    NoEndpointAvailable,
    #[error("session {session} timed out after {}s", .after.as_secs())]
    Timeout { session: String, after: Duration },
    #[error("session {session}: {source}")]
    Session {
        session: String,
        #[source]
        source: SessionError,
    },
}

/// A completed dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub reply: BackendReply,
    /// Name of the session that served the prompt.
    pub session: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    pub name: String,
    pub url: String,
    pub state: SessionState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStatus {
    pub total: usize,
    pub available: usize,
    pub sessions: Vec<SessionStatus>,
}

struct PoolState {
    /// Every endpoint ever configured or registered, in registration order.
    configured: Vec<Endpoint>,
    /// Healthy sessions, in registration order.
    sessions: Vec<Arc<dyn Session>>,
    cursor: usize,
}

#[derive(Clone)]
pub struct SessionPool<C: SessionConnector> {
    connector: C,
    config: PoolConfig,
    state: Arc<Mutex<PoolState>>,
}

impl<C: SessionConnector> SessionPool<C> {
    pub fn new(connector: C, endpoints: Vec<Endpoint>, config: PoolConfig) -> Self {
        Self {
            connector,
            config,
            state: Arc::new(Mutex::new(PoolState {
                configured: endpoints,
                sessions: Vec::new(),
                cursor: 0,
            })),
        }
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Connect every configured endpoint. Individual failures are logged;
    /// the pool is usable as long as one session connected.
    pub async fn initialize(&self) -> Result<usize, PoolError> {
        let endpoints = self.state.lock().configured.clone();
        tracing::info!(endpoints = endpoints.len(), "initializing session pool");

        for endpoint in &endpoints {
            match self.connector.connect(endpoint).await {
                Ok(session) => {
                    tracing::info!(session = %endpoint.name, url = %endpoint.url, "session connected");
                    self.insert(session);
                }
                Err(e) => {
                    tracing::error!(
                        session = %endpoint.name,
                        url = %endpoint.url,
                        error = %e,
                        "session connect failed"
                    );
                }
            }
        }

        let connected = self.state.lock().sessions.len();
        if connected == 0 {
            return Err(PoolError::NoSessions { attempted: endpoints.len() });
        }
        tracing::info!(connected, total = endpoints.len(), "session pool ready");
        Ok(connected)
    }

    /// Next healthy session in round-robin order. Never blocks.
    pub fn acquire(&self) -> Result<Arc<dyn Session>, PoolError> {
        let mut state = self.state.lock();
        if state.sessions.is_empty() {
            return Err(PoolError::NoEndpointAvailable);
        }
        let index = state.cursor % state.sessions.len();
        state.cursor = state.cursor.wrapping_add(1);
        Ok(Arc::clone(&state.sessions[index]))
    }

    /// Session by endpoint name, if healthy.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Session>> {
        self.state.lock().sessions.iter().find(|s| s.endpoint().name == name).cloned()
    }

    /// Acquire a session and submit the prompt, bounded by the dispatch
    /// timeout.
    pub async fn dispatch(&self, prompt: &str) -> Result<Dispatched, PoolError> {
        let session = self.acquire()?;
        let name = session.endpoint().name.clone();
        tracing::debug!(session = %name, prompt_chars = prompt.chars().count(), "dispatching prompt");

        match tokio::time::timeout(self.config.dispatch_timeout, session.call(prompt)).await {
            Ok(Ok(reply)) => Ok(Dispatched { reply, session: name }),
            Ok(Err(source)) => Err(PoolError::Session { session: name, source }),
            Err(_) => Err(PoolError::Timeout { session: name, after: self.config.dispatch_timeout }),
        }
    }

    /// Probe every session and evict the ones that fail. Returns the names
    /// of evicted sessions.
    pub async fn check_health(&self) -> Vec<String> {
        let sessions = self.state.lock().sessions.clone();
        let mut failed = Vec::new();
        for session in sessions {
            let healthy = matches!(
                tokio::time::timeout(self.config.probe_timeout, session.probe()).await,
                Ok(Ok(()))
            );
            if !healthy {
                failed.push(session);
            }
        }
        if failed.is_empty() {
            return Vec::new();
        }

        self.state.lock().sessions.retain(|s| !failed.iter().any(|f| Arc::ptr_eq(s, f)));

        let mut evicted = Vec::with_capacity(failed.len());
        for session in failed {
            let name = session.endpoint().name.clone();
            tracing::warn!(session = %name, "session unhealthy, removed from pool");
            if let Err(e) = session.close().await {
                tracing::debug!(session = %name, error = %e, "close after eviction failed");
            }
            evicted.push(name);
        }
        evicted
    }

    /// Run [`check_health`](Self::check_health) every `interval` until
    /// cancelled.
    pub fn spawn_health_probe(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let pool = self.clone();
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        let evicted = pool.check_health().await;
                        if !evicted.is_empty() {
                            tracing::info!(?evicted, available = pool.status().available, "health check evicted sessions");
                        }
                    }
                }
            }
            tracing::debug!("health probe stopped");
        })
    }

    /// Connect (or reconnect) one endpoint and add it to the rotation.
    ///
    /// A healthy session already registered under the same name is replaced.
    pub async fn register(&self, endpoint: Endpoint) -> Result<(), PoolError> {
        let session = self
            .connector
            .connect(&endpoint)
            .await
            .map_err(|source| PoolError::Session { session: endpoint.name.clone(), source })?;

        let replaced = {
            let mut state = self.state.lock();
            match state.configured.iter_mut().find(|e| e.name == endpoint.name) {
                Some(existing) => *existing = endpoint.clone(),
                None => state.configured.push(endpoint.clone()),
            }
            match state.sessions.iter_mut().find(|s| s.endpoint().name == endpoint.name) {
                Some(slot) => Some(std::mem::replace(slot, session)),
                None => {
                    state.sessions.push(session);
                    None
                }
            }
        };
        if let Some(old) = replaced {
            if let Err(e) = old.close().await {
                tracing::debug!(session = %endpoint.name, error = %e, "close of replaced session failed");
            }
        }
        tracing::info!(session = %endpoint.name, url = %endpoint.url, "session registered");
        Ok(())
    }

    pub fn status(&self) -> PoolStatus {
        let state = self.state.lock();
        let sessions = state
            .configured
            .iter()
            .map(|endpoint| {
                let connected = state.sessions.iter().any(|s| s.endpoint().name == endpoint.name);
                SessionStatus {
                    name: endpoint.name.clone(),
                    url: endpoint.url.clone(),
                    state: if connected { SessionState::Connected } else { SessionState::Disconnected },
                }
            })
            .collect();
        PoolStatus { total: state.configured.len(), available: state.sessions.len(), sessions }
    }

    /// Close every session. Individual failures are logged, never raised.
    pub async fn shutdown(&self) {
        let sessions = std::mem::take(&mut self.state.lock().sessions);
        for session in sessions {
            let name = session.endpoint().name.clone();
            match session.close().await {
                Ok(()) => tracing::info!(session = %name, "session closed"),
                Err(e) => tracing::warn!(session = %name, error = %e, "session close failed"),
            }
        }
    }

    fn insert(&self, session: Arc<dyn Session>) {
        self.state.lock().sessions.push(session);
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
