// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Runtime errors for a single method invocation.
//!
//! An invocation latches at most one of these; whichever comes first wins and is what
//! the caller sees, converted to a [`StructuredApiError`] for the wire.

use crate::config::consts::codes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The error shape callers receive: the same format upstream backends use, so an
/// upstream error can be carried end-to-end without translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredApiError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl StructuredApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl fmt::Display for StructuredApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Per-field parameter validation failures, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(pub BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

/// Errors that terminate a single invocation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvocationError {
    #[error("No such method: '{0}'")]
    NoSuchMethod(String),

    #[error("Input validation failed: {0}")]
    Validation(ValidationErrors),

    /// Error reported by a backend, carried verbatim
    #[error("Upstream error from step '{step}': {error}")]
    Upstream {
        step: String,
        error: StructuredApiError,
    },

    /// Backend response that couldn't be interpreted
    #[error("Failed to parse response of step '{step}': {reason}")]
    Parse { step: String, reason: String },

    #[error("Failed to render step '{step}': {reason}")]
    Render { step: String, reason: String },

    #[error("Transport failure for step '{step}': {reason}")]
    Transport { step: String, reason: String },

    /// The caller went away or the connection closed
    #[error("Invocation cancelled")]
    Cancelled,

    #[error("Invocation exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl InvocationError {
    /// Convert to the wire error shape. Upstream errors are returned unchanged.
    pub fn to_api_error(&self) -> StructuredApiError {
        match self {
            InvocationError::Upstream { error, .. } => error.clone(),
            InvocationError::Validation(errors) => {
                let details: Map<String, Value> = errors
                    .0
                    .iter()
                    .map(|(field, message)| (field.clone(), Value::String(message.clone())))
                    .collect();
                StructuredApiError::new(codes::INPUT_VALIDATION_FAILED, "input validation failed")
                    .with_details(Value::Object(details))
            }
            InvocationError::NoSuchMethod(_) => {
                StructuredApiError::new(codes::NO_SUCH_METHOD, self.to_string())
            }
            InvocationError::Parse { .. } => {
                StructuredApiError::new(codes::BACKEND_RESPONSE_INVALID, self.to_string())
            }
            InvocationError::Render { .. } => {
                StructuredApiError::new(codes::TEMPLATE_RENDER_FAILED, self.to_string())
            }
            InvocationError::Transport { .. } => {
                StructuredApiError::new(codes::BACKEND_UNAVAILABLE, self.to_string())
            }
            InvocationError::Cancelled => StructuredApiError::new(codes::CANCELLED, self.to_string()),
            InvocationError::DeadlineExceeded(_) => {
                StructuredApiError::new(codes::DEADLINE_EXCEEDED, self.to_string())
            }
            InvocationError::Internal(_) => StructuredApiError::new(codes::INTERNAL, self.to_string()),
        }
    }

    /// Whether the caller should get no response at all.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, InvocationError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn upstream_error_is_passed_through_verbatim() {
        let upstream = StructuredApiError::new("X", "Y").with_details(json!({"k": 1}));
        let err = InvocationError::Upstream {
            step: "profile".to_string(),
            error: upstream.clone(),
        };
        assert_eq!(err.to_api_error(), upstream);
    }

    #[test]
    fn validation_error_details_map_fields_to_messages() {
        let mut errors = ValidationErrors::new();
        errors.add("param1", "missing");
        errors.add("extra", "not allowed");

        let api = InvocationError::Validation(errors).to_api_error();
        assert_eq!(api.code, "InputValidationFailed");
        assert_eq!(
            api.details,
            Some(json!({"param1": "missing", "extra": "not allowed"}))
        );
    }

    #[test]
    fn details_are_omitted_when_absent() {
        let api = InvocationError::Cancelled.to_api_error();
        let wire = serde_json::to_value(&api).unwrap();
        assert_eq!(wire, json!({"code": "Cancelled", "message": "Invocation cancelled"}));
    }
}
