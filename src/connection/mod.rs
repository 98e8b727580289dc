// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Connection-level plumbing: correlation of shared upstream traffic, call envelopes,
//! and client sessions.

pub mod envelope;
pub mod gateway;
pub mod multiplexer;
pub mod session;

pub use envelope::{Envelope, InboundCall};
pub use gateway::Gateway;
pub use multiplexer::{CorrelationId, Multiplexer, PendingResponse, Routed};
pub use session::Session;
