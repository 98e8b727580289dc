// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Correlation of outbound requests with inbound responses on one shared connection.
//!
//! Every outstanding round trip owns a [`PendingResponse`], registered under a fresh
//! correlation id. Inbound frames carrying a known id are delivered exactly once to that
//! waiter; everything else is pass-through traffic for the caller to forward.
//!
//! A wait dropped before its response arrived (its invocation failed or timed out) leaves
//! its id behind as abandoned. The late response is then dropped instead of passed
//! through, so backend fields never reach the client unfiltered.
//!
//! Closing the multiplexer cancels its token before clearing the map, so waiters observe
//! cancellation rather than a dropped channel, and no pending entry outlives the
//! connection.

use crate::errors::InvocationError;
use crate::observability::messages::{
    connection::{LateResponseDropped, ResponseDelivered, WaitsAbandoned},
    StructuredLog,
};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Identifier embedded in an outbound request and echoed back in its response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for CorrelationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What happened to an inbound frame offered to the multiplexer
#[derive(Debug, PartialEq)]
pub enum Routed {
    /// Handed to the waiter registered for its correlation id
    Delivered,
    /// Late response to a wait that was abandoned; discarded
    Dropped,
    /// Not ours; forward unchanged
    PassThrough(Vec<u8>),
}

#[derive(Default)]
struct Table {
    pending: HashMap<CorrelationId, oneshot::Sender<Vec<u8>>>,
    abandoned: HashSet<CorrelationId>,
}

struct Shared {
    table: Mutex<Table>,
    closed: CancellationToken,
}

/// Per-connection correlation table. Cheap to clone; clones share the table.
#[derive(Clone)]
pub struct Multiplexer {
    shared: Arc<Shared>,
}

impl Multiplexer {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                table: Mutex::new(Table::default()),
                closed: CancellationToken::new(),
            }),
        }
    }

    /// Register a waiter under a fresh correlation id.
    ///
    /// After [`close`](Self::close) the waiter is not registered and fails on first
    /// receive.
    pub fn await_response(&self) -> PendingResponse {
        let id = CorrelationId::new();
        let (tx, rx) = oneshot::channel();
        {
            let mut table = self.shared.table.lock();
            if !self.shared.closed.is_cancelled() {
                table.pending.insert(id.clone(), tx);
            }
        }

        PendingResponse {
            id,
            rx,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Hand `payload` to the waiter for `id`. Returns `false` if there is none
    /// (unknown, already delivered, or dropped), so the caller can pass the frame on.
    pub fn deliver(&self, id: &CorrelationId, payload: Vec<u8>) -> bool {
        let sender = self.shared.table.lock().pending.remove(id);
        match sender {
            Some(tx) => {
                let delivered = tx.send(payload).is_ok();
                if delivered {
                    ResponseDelivered {
                        correlation_id: id.as_str(),
                    }
                    .log();
                }
                delivered
            }
            None => false,
        }
    }

    /// Offer an inbound frame: frames with a string correlation field go to
    /// [`deliver`](Self::deliver). Late responses to abandoned waits are dropped, at most
    /// once per id. Anything else comes back as pass-through.
    pub fn route_inbound(&self, frame: Vec<u8>) -> Routed {
        let Some(id) = correlation_of(&frame) else {
            return Routed::PassThrough(frame);
        };
        if self.deliver(&id, frame.clone()) {
            return Routed::Delivered;
        }
        if self.shared.table.lock().abandoned.remove(&id) {
            LateResponseDropped {
                correlation_id: id.as_str(),
                bytes: frame.len(),
            }
            .log();
            return Routed::Dropped;
        }
        Routed::PassThrough(frame)
    }

    /// Abandon every pending wait and forget abandoned ids. Returns how many waits were
    /// still pending.
    pub fn close(&self) -> usize {
        self.shared.closed.cancel();
        let abandoned = {
            let mut table = self.shared.table.lock();
            let count = table.pending.len();
            table.pending.clear();
            table.abandoned.clear();
            count
        };
        if abandoned > 0 {
            WaitsAbandoned { count: abandoned }.log();
        }
        abandoned
    }

    pub fn pending_count(&self) -> usize {
        self.shared.table.lock().pending.len()
    }

    /// Abandoned ids whose late response has not arrived
    pub fn abandoned_count(&self) -> usize {
        self.shared.table.lock().abandoned.len()
    }
}

impl Default for Multiplexer {
    fn default() -> Self {
        Self::new()
    }
}

// Only the correlation field is decoded; the rest of the frame stays opaque.
#[derive(Deserialize)]
struct CorrelationProbe {
    correlation_id: Option<String>,
}

fn correlation_of(frame: &[u8]) -> Option<CorrelationId> {
    serde_json::from_slice::<CorrelationProbe>(frame)
        .ok()?
        .correlation_id
        .map(CorrelationId::from)
}

/// One outstanding round trip. Dropping it before delivery unregisters it and marks its
/// id abandoned.
pub struct PendingResponse {
    id: CorrelationId,
    rx: oneshot::Receiver<Vec<u8>>,
    shared: Arc<Shared>,
}

impl PendingResponse {
    pub fn id(&self) -> &CorrelationId {
        &self.id
    }

    /// Wait for the response, or fail with `Cancelled` once the connection closes.
    pub async fn recv(&mut self) -> Result<Vec<u8>, InvocationError> {
        tokio::select! {
            biased;
            payload = &mut self.rx => payload.map_err(|_| InvocationError::Cancelled),
            _ = self.shared.closed.cancelled() => Err(InvocationError::Cancelled),
        }
    }
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        let mut table = self.shared.table.lock();
        if table.pending.remove(&self.id).is_some() {
            table.abandoned.insert(self.id.clone());
        }
    }
}
