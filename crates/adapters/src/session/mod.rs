// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sessions: live handles to one model front-end endpoint.

mod cdp;
#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use cdp::{CdpConfig, CdpConnector, DEFAULT_BRIDGE};
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeCall, FakeConnector};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// A named automation endpoint (a DevTools HTTP base URL for the reference
/// session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub url: String,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self { name: name.into(), url: url.into() }
    }

    /// Name a list of URLs `browser-1`, `browser-2`, ... in order.
    pub fn numbered<I, S>(urls: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        urls.into_iter()
            .map(|url| url.as_ref().trim().to_string())
            .filter(|url| !url.is_empty())
            .enumerate()
            .map(|(i, url)| Self::new(format!("browser-{}", i + 1), url))
            .collect()
    }
}

/// Raw reply from one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub answer: String,
    /// Conversation reference reported by the front end, if any.
    pub session_ref: Option<String>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("call failed: {0}")]
    Call(String),
    #[error("session closed")]
    Closed,
}

/// One connected endpoint.
#[async_trait]
pub trait Session: Send + Sync {
    fn endpoint(&self) -> &Endpoint;

    /// Cheap liveness check.
    async fn probe(&self) -> Result<(), SessionError>;

    /// Submit a prompt and wait for the complete reply.
    async fn call(&self, prompt: &str) -> Result<BackendReply, SessionError>;

    async fn close(&self) -> Result<(), SessionError>;
}

/// Opens sessions for endpoints.
#[async_trait]
pub trait SessionConnector: Clone + Send + Sync + 'static {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn Session>, SessionError>;
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
