// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::InvocationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const ECHO: &str = "echo";
const REQUEST_ID: &str = "request_id";
const PASS_THROUGH: &str = "pass_through";
const ERROR: &str = "error";
const RESERVED: [&str; 4] = [ECHO, REQUEST_ID, PASS_THROUGH, ERROR];

/// A logical call as sent by a client.
///
/// `request_id` and `pass_through` are opaque to the gateway and echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboundCall {
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub request_id: Option<Value>,
    #[serde(default)]
    pub pass_through: Option<Value>,
    #[serde(skip)]
    raw: Value,
}

impl InboundCall {
    /// Parse a client frame as a call. `None` means it is not a call (pass-through).
    pub fn parse(frame: &[u8]) -> Option<Self> {
        let raw: Value = serde_json::from_slice(frame).ok()?;
        if !raw.is_object() {
            return None;
        }
        let mut call: InboundCall = serde_json::from_value(raw.clone()).ok()?;
        call.raw = raw;
        Some(call)
    }

    /// Wrap an invocation outcome in the reply envelope.
    ///
    /// On success the merged fields sit at the top level next to the echo. Merged fields
    /// named like a reserved member are dropped; the reserved members always win.
    pub fn reply(&self, outcome: &Result<Map<String, Value>, InvocationError>) -> Envelope {
        let mut members = match outcome {
            Ok(fields) => fields.clone(),
            Err(_) => Map::new(),
        };
        for reserved in RESERVED {
            members.remove(reserved);
        }

        members.insert(ECHO.to_string(), self.raw.clone());
        if let Some(request_id) = &self.request_id {
            members.insert(REQUEST_ID.to_string(), request_id.clone());
        }
        if let Some(pass_through) = &self.pass_through {
            members.insert(PASS_THROUGH.to_string(), pass_through.clone());
        }
        if let Err(err) = outcome {
            let error = serde_json::to_value(err.to_api_error()).unwrap_or(Value::Null);
            members.insert(ERROR.to_string(), error);
        }

        Envelope(members)
    }
}

/// Reply to one call: the echoed call plus either the merged fields or a single error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Envelope(Map<String, Value>);

impl Envelope {
    pub fn get(&self, member: &str) -> Option<&Value> {
        self.0.get(member)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
