// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for correlation routing and connection lifecycle.

use crate::errors::TransportError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// An inbound frame was handed to the waiter registered for its correlation id.
///
/// # Log Level
/// `trace!` - Hot path
pub struct ResponseDelivered<'a> {
    pub correlation_id: &'a str,
}

impl Display for ResponseDelivered<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Delivered response for {}", self.correlation_id)
    }
}

impl StructuredLog for ResponseDelivered<'_> {
    fn log(&self) {
        tracing::trace!(correlation_id = self.correlation_id, "{}", self);
    }
}

/// A response arrived for a wait its invocation had already given up on.
///
/// # Log Level
/// `debug!` - Expected after a failed or timed out invocation
pub struct LateResponseDropped<'a> {
    pub correlation_id: &'a str,
    pub bytes: usize,
}

impl Display for LateResponseDropped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Dropped late response for {} ({} bytes)",
            self.correlation_id, self.bytes
        )
    }
}

impl StructuredLog for LateResponseDropped<'_> {
    fn log(&self) {
        tracing::debug!(correlation_id = self.correlation_id, bytes = self.bytes, "{}", self);
    }
}

/// A frame was forwarded unchanged to the other side of the connection.
///
/// # Log Level
/// `debug!` - Per-frame detail
pub struct PassThroughForwarded<'a> {
    pub direction: &'a str,
    pub bytes: usize,
}

impl Display for PassThroughForwarded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Forwarded {} bytes {}", self.bytes, self.direction)
    }
}

impl StructuredLog for PassThroughForwarded<'_> {
    fn log(&self) {
        tracing::debug!(direction = self.direction, bytes = self.bytes, "{}", self);
    }
}

/// Pending waits were abandoned because their connection closed.
///
/// # Log Level
/// `info!` - Lifecycle event
pub struct WaitsAbandoned {
    pub count: usize,
}

impl Display for WaitsAbandoned {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Connection closed with {} pending waits abandoned", self.count)
    }
}

impl StructuredLog for WaitsAbandoned {
    fn log(&self) {
        tracing::info!(count = self.count, "{}", self);
    }
}

/// A call finished without writing a reply because its caller went away.
///
/// # Log Level
/// `debug!` - Expected on disconnect
pub struct ReplySuppressed<'a> {
    pub method: &'a str,
}

impl Display for ReplySuppressed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Call '{}' cancelled, no reply sent", self.method)
    }
}

impl StructuredLog for ReplySuppressed<'_> {
    fn log(&self) {
        tracing::debug!(method = self.method, "{}", self);
    }
}

/// Writing a frame to a peer failed.
///
/// # Log Level
/// `warn!` - The frame is lost
pub struct FrameWriteFailed<'a> {
    pub target: &'a str,
    pub error: &'a TransportError,
}

impl Display for FrameWriteFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Failed to write frame to {}: {}", self.target, self.error)
    }
}

impl StructuredLog for FrameWriteFailed<'_> {
    fn log(&self) {
        tracing::warn!(target_peer = self.target, error = %self.error, "{}", self);
    }
}

/// A client session was torn down.
///
/// # Log Level
/// `info!` - Lifecycle event
pub struct SessionClosed {
    pub in_flight_calls: usize,
    pub abandoned_waits: usize,
}

impl Display for SessionClosed {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Session closed: {} calls in flight, {} waits abandoned",
            self.in_flight_calls, self.abandoned_waits
        )
    }
}

impl StructuredLog for SessionClosed {
    fn log(&self) {
        tracing::info!(
            in_flight_calls = self.in_flight_calls,
            abandoned_waits = self.abandoned_waits,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("session", span_name = name)
    }
}
