// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chrome DevTools Protocol session.
//!
//! Discovery goes through the endpoint's `/json/list`; the first `page`
//! target's WebSocket is then driven directly. A background reader task
//! demultiplexes command responses by id. Prompts are handed to a page-side
//! bridge function that resolves with the model's reply.

use super::{BackendReply, Endpoint, Session, SessionConnector, SessionError};
use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Page-side function that takes the prompt and resolves with the reply.
pub const DEFAULT_BRIDGE: &str = "window.__jobRelay.ask";

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, SessionError>>>>>;

#[derive(Debug, Clone)]
pub struct CdpConfig {
    /// Expression evaluating to the bridge function.
    pub bridge: String,
    /// Bound on discovery and the WebSocket handshake.
    pub connect_timeout: Duration,
}

impl Default for CdpConfig {
    fn default() -> Self {
        Self { bridge: DEFAULT_BRIDGE.to_string(), connect_timeout: Duration::from_secs(10) }
    }
}

#[derive(Clone)]
pub struct CdpConnector {
    http: reqwest::Client,
    config: CdpConfig,
}

impl CdpConnector {
    pub fn new(config: CdpConfig) -> Self {
        Self { http: reqwest::Client::new(), config }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct Target {
    #[serde(rename = "type", default)]
    pub(crate) kind: String,
    #[serde(rename = "webSocketDebuggerUrl", default)]
    pub(crate) ws_url: Option<String>,
}

/// WebSocket URL of the first page target.
pub(crate) fn page_socket(targets: Vec<Target>) -> Option<String> {
    targets.into_iter().filter(|t| t.kind == "page").find_map(|t| t.ws_url)
}

#[async_trait]
impl SessionConnector for CdpConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<Arc<dyn Session>, SessionError> {
        let list_url = format!("{}/json/list", endpoint.url.trim_end_matches('/'));
        let targets: Vec<Target> = self
            .http
            .get(&list_url)
            .timeout(self.config.connect_timeout)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SessionError::Connect(format!("{list_url}: {e}")))?
            .json()
            .await
            .map_err(|e| SessionError::Connect(format!("{list_url}: {e}")))?;
        let ws_url = page_socket(targets)
            .ok_or_else(|| SessionError::Connect(format!("{}: no page target", endpoint.url)))?;

        let (socket, _) = tokio::time::timeout(
            self.config.connect_timeout,
            tokio_tungstenite::connect_async(ws_url.as_str()),
        )
        .await
        .map_err(|_| SessionError::Connect(format!("{ws_url}: handshake timed out")))?
        .map_err(|e| SessionError::Connect(format!("{ws_url}: {e}")))?;

        let (sink, stream) = socket.split();
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let reader = tokio::spawn(read_loop(stream, Arc::clone(&pending), endpoint.name.clone()));
        tracing::info!(session = %endpoint.name, url = %endpoint.url, "cdp session connected");

        Ok(Arc::new(CdpSession {
            endpoint: endpoint.clone(),
            bridge: self.config.bridge.clone(),
            sink: tokio::sync::Mutex::new(sink),
            pending,
            next_id: AtomicU64::new(1),
            reader: Mutex::new(Some(reader)),
        }))
    }
}

struct CdpSession {
    endpoint: Endpoint,
    bridge: String,
    sink: tokio::sync::Mutex<SplitSink<Socket, Message>>,
    pending: Pending,
    next_id: AtomicU64,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl CdpSession {
    async fn command(&self, method: &str, params: Value) -> Result<Value, SessionError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        let frame = json!({"id": id, "method": method, "params": params}).to_string();
        if let Err(e) = self.sink.lock().await.send(Message::text(frame)).await {
            self.pending.lock().remove(&id);
            return Err(SessionError::Protocol(e.to_string()));
        }
        rx.await.map_err(|_| SessionError::Closed)?
    }
}

#[async_trait]
impl Session for CdpSession {
    fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    async fn probe(&self) -> Result<(), SessionError> {
        self.command("Browser.getVersion", json!({})).await.map(|_| ())
    }

    async fn call(&self, prompt: &str) -> Result<BackendReply, SessionError> {
        let response = self
            .command(
                "Runtime.evaluate",
                json!({
                    "expression": bridge_expression(&self.bridge, prompt),
                    "awaitPromise": true,
                    "returnByValue": true,
                }),
            )
            .await?;
        evaluation_reply(&response)
    }

    async fn close(&self) -> Result<(), SessionError> {
        let result = self.sink.lock().await.close().await;
        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }
        fail_pending(&self.pending);
        result.map_err(|e| SessionError::Protocol(e.to_string()))
    }
}

impl Drop for CdpSession {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }
    }
}

async fn read_loop(mut stream: SplitStream<Socket>, pending: Pending, session: String) {
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => {
                let Ok(frame) = serde_json::from_str::<Value>(&text) else {
                    tracing::debug!(%session, "cdp: unparseable frame");
                    continue;
                };
                // Frames without an id are protocol events
                let Some(id) = frame.get("id").and_then(Value::as_u64) else {
                    continue;
                };
                if let Some(tx) = pending.lock().remove(&id) {
                    let _ = tx.send(command_result(frame));
                }
            }
            Ok(Message::Close(frame)) => {
                tracing::info!(%session, ?frame, "cdp: received close frame");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(%session, error = %e, "cdp: socket error");
                break;
            }
        }
    }
    fail_pending(&pending);
}

/// Drop every waiter; their receivers observe the session as closed.
fn fail_pending(pending: &Pending) {
    pending.lock().clear();
}

pub(crate) fn command_result(mut frame: Value) -> Result<Value, SessionError> {
    if let Some(error) = frame.get("error") {
        let message = error.get("message").and_then(Value::as_str).unwrap_or("unknown error");
        return Err(SessionError::Protocol(message.to_string()));
    }
    Ok(frame.get_mut("result").map(Value::take).unwrap_or(Value::Null))
}

/// `(<bridge>)(<prompt as JSON string>)`
pub(crate) fn bridge_expression(bridge: &str, prompt: &str) -> String {
    let literal = serde_json::to_string(prompt).unwrap_or_else(|_| "\"\"".to_string());
    format!("({bridge})({literal})")
}

/// Extract the reply from a `Runtime.evaluate` result.
///
/// The bridge may resolve with a plain string or with
/// `{answer, url}`; anything else is passed through as compact JSON.
pub(crate) fn evaluation_reply(response: &Value) -> Result<BackendReply, SessionError> {
    if let Some(details) = response.get("exceptionDetails") {
        let message = details
            .pointer("/exception/description")
            .or_else(|| details.get("text"))
            .and_then(Value::as_str)
            .unwrap_or("evaluation threw");
        return Err(SessionError::Call(message.to_string()));
    }
    let value = response.pointer("/result/value").unwrap_or(&Value::Null);
    match value {
        Value::String(answer) => Ok(BackendReply { answer: answer.clone(), session_ref: None }),
        Value::Object(obj) => match obj.get("answer").and_then(Value::as_str) {
            Some(answer) => Ok(BackendReply {
                answer: answer.to_string(),
                session_ref: obj.get("url").and_then(Value::as_str).map(str::to_string),
            }),
            None => Ok(BackendReply { answer: value.to_string(), session_ref: None }),
        },
        Value::Null => Err(SessionError::Call("bridge returned no reply".to_string())),
        other => Ok(BackendReply { answer: other.to_string(), session_ref: None }),
    }
}

#[cfg(test)]
#[path = "cdp_tests.rs"]
mod tests;
