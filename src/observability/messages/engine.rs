// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for invocation and step lifecycle events.
//!
//! This module contains message types for logging events related to:
//! * Invocation lifecycle (start, completion, failure)
//! * Step dispatch and completion
//! * Merge anomalies (field collisions, missing allow-listed fields)

use crate::errors::InvocationError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use tracing::Span;

/// Invocation of a method started.
///
/// # Log Level
/// `debug!` - Per-call detail
///
/// # Example
/// ```
/// use bffgate::observability::messages::engine::InvocationStarted;
///
/// let msg = InvocationStarted {
///     method: "getProfile",
///     step_count: 3,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct InvocationStarted<'a> {
    pub method: &'a str,
    pub step_count: usize,
}

impl Display for InvocationStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Invoking '{}' with {} backend steps",
            self.method, self.step_count
        )
    }
}

impl StructuredLog for InvocationStarted<'_> {
    fn log(&self) {
        tracing::debug!(method = self.method, step_count = self.step_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "invocation",
            span_name = name,
            method = self.method,
            step_count = self.step_count,
        )
    }
}

/// Invocation composed its result successfully.
///
/// # Log Level
/// `info!` - Important operational event
pub struct InvocationCompleted<'a> {
    pub method: &'a str,
    pub field_count: usize,
    pub elapsed: Duration,
}

impl Display for InvocationCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Invocation of '{}' completed in {:?}: {} fields",
            self.method, self.elapsed, self.field_count
        )
    }
}

impl StructuredLog for InvocationCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            method = self.method,
            field_count = self.field_count,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "{}", self
        );
    }
}

/// Invocation ended with its latched error.
///
/// # Log Level
/// `warn!` - Caller receives an error (or nothing, if cancelled)
pub struct InvocationFailed<'a> {
    pub method: &'a str,
    pub error: &'a InvocationError,
    pub elapsed: Duration,
}

impl Display for InvocationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Invocation of '{}' failed after {:?}: {}",
            self.method, self.elapsed, self.error
        )
    }
}

impl StructuredLog for InvocationFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            method = self.method,
            error = %self.error,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "{}", self
        );
    }
}

/// A step's request was rendered and sent.
///
/// # Log Level
/// `debug!` - Per-step detail
pub struct StepDispatched<'a> {
    pub step: &'a str,
    pub kind: &'a str,
    pub correlation_id: &'a str,
}

impl Display for StepDispatched<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dispatched {} step '{}' as {}",
            self.kind, self.step, self.correlation_id
        )
    }
}

impl StructuredLog for StepDispatched<'_> {
    fn log(&self) {
        tracing::debug!(
            step = self.step,
            kind = self.kind,
            correlation_id = self.correlation_id,
            "{}", self
        );
    }
}

/// A step's filtered fields were merged into the result.
///
/// # Log Level
/// `debug!` - Per-step detail
pub struct StepCompleted<'a> {
    pub step: &'a str,
    pub field_count: usize,
}

impl Display for StepCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Step '{}' merged {} fields", self.step, self.field_count)
    }
}

impl StructuredLog for StepCompleted<'_> {
    fn log(&self) {
        tracing::debug!(step = self.step, field_count = self.field_count, "{}", self);
    }
}

/// Two steps wrote the same destination field; the later write wins.
///
/// # Log Level
/// `warn!` - Configuration smell
pub struct FieldCollision<'a> {
    pub step: &'a str,
    pub field: &'a str,
}

impl Display for FieldCollision<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Step '{}' overwrote field '{}' already set by another step",
            self.step, self.field
        )
    }
}

impl StructuredLog for FieldCollision<'_> {
    fn log(&self) {
        tracing::warn!(step = self.step, field = self.field, "{}", self);
    }
}

/// An allow-listed field was absent from a backend response.
///
/// # Log Level
/// `warn!` - Backend contract drift
pub struct AllowedFieldMissing<'a> {
    pub step: &'a str,
    pub field: &'a str,
}

impl Display for AllowedFieldMissing<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Response of step '{}' is missing allowed field '{}'",
            self.step, self.field
        )
    }
}

impl StructuredLog for AllowedFieldMissing<'_> {
    fn log(&self) {
        tracing::warn!(step = self.step, field = self.field, "{}", self);
    }
}

/// An error arrived after another one was already latched.
///
/// # Log Level
/// `debug!` - Discarded, the first error is what the caller sees
pub struct ErrorDiscarded<'a> {
    pub error: &'a InvocationError,
}

impl Display for ErrorDiscarded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Discarding error after first failure: {}", self.error)
    }
}

impl StructuredLog for ErrorDiscarded<'_> {
    fn log(&self) {
        tracing::debug!(error = %self.error, "{}", self);
    }
}
