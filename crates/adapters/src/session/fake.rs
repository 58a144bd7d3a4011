// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scriptable in-memory sessions for tests.

use super::{BackendReply, Endpoint, Session, SessionConnector, SessionError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// A prompt received by a fake session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeCall {
    pub session: String,
    pub prompt: String,
}

struct FakeState {
    default_reply: String,
    replies: VecDeque<Result<String, String>>,
    unreachable: HashSet<String>,
    unhealthy: HashSet<String>,
    call_delay: Option<Duration>,
    connects: Vec<String>,
    calls: Vec<FakeCall>,
    closed: Vec<String>,
}

/// Connector whose sessions reply from a script.
///
/// Replies queued with [`push_reply`](Self::push_reply) /
/// [`push_error`](Self::push_error) are consumed in order by whichever
/// session is called; once the queue is empty every call gets the default
/// reply.
#[derive(Clone)]
pub struct FakeConnector {
    inner: Arc<Mutex<FakeState>>,
}

impl Default for FakeConnector {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState {
                default_reply: r#"{"ok": true, "action": "analysis_result", "answer": "ok"}"#
                    .to_string(),
                replies: VecDeque::new(),
                unreachable: HashSet::new(),
                unhealthy: HashSet::new(),
                call_delay: None,
                connects: Vec::new(),
                calls: Vec::new(),
                closed: Vec::new(),
            })),
        }
    }
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_default_reply(&self, reply: impl Into<String>) {
        self.inner.lock().default_reply = reply.into();
    }

    pub fn push_reply(&self, reply: impl Into<String>) {
        self.inner.lock().replies.push_back(Ok(reply.into()));
    }

    pub fn push_error(&self, message: impl Into<String>) {
        self.inner.lock().replies.push_back(Err(message.into()));
    }

    /// Connecting to the named endpoint fails.
    pub fn set_unreachable(&self, name: &str) {
        self.inner.lock().unreachable.insert(name.to_string());
    }

    /// Probes of the named session fail.
    pub fn set_unhealthy(&self, name: &str) {
        self.inner.lock().unhealthy.insert(name.to_string());
    }

    pub fn set_healthy(&self, name: &str) {
        let mut inner = self.inner.lock();
        inner.unhealthy.remove(name);
        inner.unreachable.remove(name);
    }

    /// Every call sleeps this long before replying.
    pub fn set_call_delay(&self, delay: Duration) {
        self.inner.lock().call_delay = Some(delay);
    }

    pub fn connects(&self) -> Vec<String> {
        self.inner.lock().connects.clone()
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.inner.lock().calls.clone()
    }

    pub fn closed(&self) -> Vec<String> {
        self.inner.lock().closed.clone()
    }
}

#[async_trait]
impl SessionConnector for FakeConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn Session>, SessionError> {
        let mut inner = self.inner.lock();
        if inner.unreachable.contains(&endpoint.name) {
            return Err(SessionError::Connect(format!("{}: connection refused", endpoint.url)));
        }
        inner.connects.push(endpoint.name.clone());
        Ok(Arc::new(FakeSession { endpoint: endpoint.clone(), inner: Arc::clone(&self.inner) }))
    }
}

struct FakeSession {
    endpoint: Endpoint,
    inner: Arc<Mutex<FakeState>>,
}

#[async_trait]
impl Session for FakeSession {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn probe(&self) -> Result<(), SessionError> {
        if self.inner.lock().unhealthy.contains(&self.endpoint.name) {
            return Err(SessionError::Protocol("probe failed".to_string()));
        }
        Ok(())
    }

    async fn call(&self, prompt: &str) -> Result<BackendReply, SessionError> {
        let delay = {
            let mut inner = self.inner.lock();
            inner.calls.push(FakeCall {
                session: self.endpoint.name.clone(),
                prompt: prompt.to_string(),
            });
            inner.call_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut inner = self.inner.lock();
        match inner.replies.pop_front() {
            Some(Ok(answer)) => Ok(BackendReply { answer, session_ref: None }),
            Some(Err(message)) => Err(SessionError::Call(message)),
            None => Ok(BackendReply { answer: inner.default_reply.clone(), session_ref: None }),
        }
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.inner.lock().closed.push(self.endpoint.name.clone());
        Ok(())
    }
}
