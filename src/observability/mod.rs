// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging in the gateway. Message types follow a struct-based pattern with `Display`
//! implementations to:
//!
//! * Keep magic strings out of the engine and connection code
//! * Give every event a consistent set of structured fields
//! * Keep level decisions next to the message they belong to
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::config` - Method compilation and hot reload
//! * `messages::engine` - Invocation and step lifecycle
//! * `messages::connection` - Correlation routing and session teardown
//!
//! # Usage
//!
//! ```rust
//! use bffgate::observability::messages::{connection::WaitsAbandoned, StructuredLog};
//!
//! WaitsAbandoned { count: 2 }.log();
//! ```

pub mod messages;
