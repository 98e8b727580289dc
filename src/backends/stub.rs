// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Test doubles for processors, upstream connections and HTTP backends.

use crate::backends::response::{decode, normalize, upstream_error};
use crate::config::consts::ERROR_FIELD;
use crate::connection::Multiplexer;
use crate::errors::{InvocationError, TransportError};
use crate::traits::{
    BackendKind, FrameSink, HttpRequest, HttpTransport, OutboundRequest, ParsedResponse,
    StepProcessor,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Processor that keeps every response field and renders an empty push frame.
pub struct StubProcessor {
    name: String,
}

impl StubProcessor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

impl StepProcessor for StubProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Push
    }

    fn render(
        &self,
        correlation_id: &str,
        _params: &Map<String, Value>,
        _deps: &Map<String, Value>,
    ) -> Result<OutboundRequest, InvocationError> {
        Ok(OutboundRequest::Push(
            format!(r#"{{"correlation_id": "{correlation_id}"}}"#).into_bytes(),
        ))
    }

    fn parse(&self, raw: &[u8]) -> Result<ParsedResponse, InvocationError> {
        let value = decode(&self.name, raw)?;
        if let Some(error) = value.get(ERROR_FIELD) {
            return Err(InvocationError::Upstream {
                step: self.name.clone(),
                error: upstream_error(error),
            });
        }
        let body = normalize(value);
        Ok(ParsedResponse {
            fields: body.clone(),
            body,
        })
    }
}

/// Upstream that echoes every frame back through the multiplexer.
///
/// A frame carrying a numeric `delay_ms` member is echoed after that delay, which lets
/// tests control completion order. Frames with `"silent": true` are swallowed.
pub struct EchoUpstream {
    mux: Multiplexer,
    frames: Mutex<Vec<Value>>,
}

impl EchoUpstream {
    pub fn new(mux: Multiplexer) -> Arc<Self> {
        Arc::new(Self {
            mux,
            frames: Mutex::new(Vec::new()),
        })
    }

    /// Every frame sent so far, decoded
    pub async fn frames(&self) -> Vec<Value> {
        self.frames.lock().await.clone()
    }
}

#[async_trait]
impl FrameSink for EchoUpstream {
    async fn send_frame(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        let value: Value = serde_json::from_slice(&frame).unwrap_or(Value::Null);
        self.frames.lock().await.push(value.clone());

        if value.get("silent").and_then(Value::as_bool) == Some(true) {
            return Ok(());
        }
        let delay = value.get("delay_ms").and_then(Value::as_u64);
        let mux = self.mux.clone();
        tokio::spawn(async move {
            if let Some(ms) = delay {
                tokio::time::sleep(Duration::from_millis(ms)).await;
            }
            mux.route_inbound(frame);
        });
        Ok(())
    }
}

/// Sink that records frames and never answers.
#[derive(Default)]
pub struct RecordingSink {
    frames: Mutex<Vec<Vec<u8>>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().await.clone()
    }
}

#[async_trait]
impl FrameSink for RecordingSink {
    async fn send_frame(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        self.frames.lock().await.push(frame);
        Ok(())
    }
}

/// Sink whose peer is gone.
pub struct ClosedSink;

#[async_trait]
impl FrameSink for ClosedSink {
    async fn send_frame(&self, _frame: Vec<u8>) -> Result<(), TransportError> {
        Err(TransportError::Closed)
    }
}

/// HTTP transport answering from a fixed url -> body table.
///
/// Unknown urls fail like an unreachable host. Every request is recorded.
#[derive(Default)]
pub struct StubHttpTransport {
    responses: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubHttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, url: &str, body: &str) -> Self {
        self.responses.insert(url.to_string(), body.as_bytes().to_vec());
        self
    }

    pub async fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl HttpTransport for StubHttpTransport {
    async fn execute(&self, request: HttpRequest) -> Result<Vec<u8>, TransportError> {
        let response = self.responses.get(&request.url).cloned();
        self.requests.lock().await.push(request);
        response.ok_or(TransportError::NoUpstream("stubbed http"))
    }
}
