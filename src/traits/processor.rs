// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::InvocationError;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// The closed set of backend kinds a step can target. Chosen once, at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Frames pushed over the shared, multiplexed upstream connection
    Push,
    /// A standalone HTTP request per step
    Http,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Push => "push",
            BackendKind::Http => "http",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

/// A rendered request, ready for the transport of its kind.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundRequest {
    /// Serialized JSON frame with the correlation id embedded
    Push(Vec<u8>),
    Http(HttpRequest),
}

/// A successfully parsed backend response.
///
/// `body` is the normalized response object; `fields` is what survives the allow-list and
/// rename map and gets merged into the invocation result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedResponse {
    pub body: Map<String, Value>,
    pub fields: Map<String, Value>,
}

/// One compiled backend step: renders its outbound request and interprets the reply.
///
/// Implementations are immutable after compilation and shared across concurrent
/// invocations of the same method.
pub trait StepProcessor: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> BackendKind;

    /// Render the outbound request.
    ///
    /// `deps` maps each declared dependency's step name to its filtered fields.
    fn render(
        &self,
        correlation_id: &str,
        params: &Map<String, Value>,
        deps: &Map<String, Value>,
    ) -> Result<OutboundRequest, InvocationError>;

    /// Parse a raw response into normalized body and filtered fields.
    ///
    /// Error responses fail with `InvocationError::Upstream`, carrying the backend's
    /// error unchanged.
    fn parse(&self, raw: &[u8]) -> Result<ParsedResponse, InvocationError>;
}
