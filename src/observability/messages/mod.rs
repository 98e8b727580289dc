// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for a human-readable line and
//! [`StructuredLog`] to emit the event with structured fields at its level.
//!
//! # Organization
//!
//! * `config` - Compilation failures, handler swaps, hot reload
//! * `engine` - Invocation and step lifecycle, merge warnings
//! * `connection` - Correlation delivery, pass-through, teardown
//!
//! # Usage Pattern
//!
//! ```rust
//! use bffgate::observability::messages::{engine::InvocationStarted, StructuredLog};
//!
//! let msg = InvocationStarted {
//!     method: "getProfile",
//!     step_count: 2,
//! };
//!
//! let span = msg.span("invocation");
//! let _guard = span.enter();
//! msg.log();
//! ```

use std::fmt::Display;
use tracing::Span;

pub mod config;
pub mod connection;
pub mod engine;

/// A log message that knows its level and structured fields.
pub trait StructuredLog: Display {
    /// Emit the event at the message's documented level
    fn log(&self);

    /// Open a span carrying the message's fields
    fn span(&self, name: &str) -> Span {
        tracing::info_span!("event", span_name = name)
    }
}
