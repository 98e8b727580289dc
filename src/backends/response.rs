// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Response handling shared by every backend kind: decoding, normalization to a
//! mapping, upstream error extraction and allow-list filtering.

use crate::config::consts::{codes, LIST_KEY, VALUE_KEY};
use crate::errors::{InvocationError, StructuredApiError};
use crate::observability::messages::{engine::AllowedFieldMissing, StructuredLog};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Decode a raw body as JSON.
pub fn decode(step: &str, raw: &[u8]) -> Result<Value, InvocationError> {
    serde_json::from_slice(raw).map_err(|e| InvocationError::Parse {
        step: step.to_string(),
        reason: e.to_string(),
    })
}

/// Bring any JSON value into mapping form.
///
/// Objects map as-is, arrays are wrapped under `list` and everything else under `value`.
pub fn normalize(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Array(_) => Map::from_iter([(LIST_KEY.to_string(), value)]),
        other => Map::from_iter([(VALUE_KEY.to_string(), other)]),
    }
}

/// Interpret a backend's `error` member.
///
/// Object errors keep their `code`, `message` and `details`; a numeric code is
/// stringified. Anything else is reported under a generic upstream code.
pub fn upstream_error(error: &Value) -> StructuredApiError {
    match error {
        Value::Object(fields) => {
            let code = match fields.get("code") {
                Some(Value::String(code)) => code.clone(),
                Some(Value::Number(code)) => code.to_string(),
                _ => codes::UPSTREAM_ERROR.to_string(),
            };
            let message = fields
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default();

            let api = StructuredApiError::new(code, message);
            match fields.get("details") {
                Some(details) if !details.is_null() => api.with_details(details.clone()),
                _ => api,
            }
        }
        Value::String(message) => StructuredApiError::new(codes::UPSTREAM_ERROR, message.clone()),
        other => StructuredApiError::new(codes::UPSTREAM_ERROR, other.to_string()),
    }
}

/// Allow-list plus rename map for one step.
#[derive(Debug, Clone, Default)]
pub struct FieldFilter {
    allow: Vec<String>,
    renames: HashMap<String, String>,
}

impl FieldFilter {
    pub fn new(allow: Vec<String>, renames: HashMap<String, String>) -> Self {
        Self { allow, renames }
    }

    /// Copy allow-listed fields out of `body`, renaming as configured.
    ///
    /// A missing allow-listed field is logged and skipped.
    pub fn apply(&self, step: &str, body: &Map<String, Value>) -> Map<String, Value> {
        let mut fields = Map::new();
        for name in &self.allow {
            match body.get(name) {
                Some(value) => {
                    let destination = self.renames.get(name).unwrap_or(name);
                    fields.insert(destination.clone(), value.clone());
                }
                None => AllowedFieldMissing { step, field: name }.log(),
            }
        }
        fields
    }
}
