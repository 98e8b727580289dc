// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! One client connection paired with its upstream connection.
//!
//! Client frames that are calls to registered methods are orchestrated, each on its own
//! task. Everything else travels through unchanged in both directions, so one pair of
//! physical connections carries orchestrated and free-form traffic side by side.

use crate::connection::envelope::InboundCall;
use crate::connection::gateway::Gateway;
use crate::connection::multiplexer::{Multiplexer, Routed};
use crate::engine::{CompiledHandler, Dispatcher};
use crate::observability::messages::{
    connection::{FrameWriteFailed, PassThroughForwarded, ReplySuppressed, SessionClosed},
    StructuredLog,
};
use crate::traits::FrameSink;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

const TO_CLIENT: &str = "to client";
const TO_UPSTREAM: &str = "to upstream";

pub struct Session {
    gateway: Gateway,
    mux: Multiplexer,
    client: Arc<dyn FrameSink>,
    upstream: Arc<dyn FrameSink>,
    token: CancellationToken,
    calls: Mutex<JoinSet<()>>,
}

impl Session {
    pub fn new(gateway: Gateway, client: Arc<dyn FrameSink>, upstream: Arc<dyn FrameSink>) -> Self {
        Self {
            gateway,
            mux: Multiplexer::new(),
            client,
            upstream,
            token: CancellationToken::new(),
            calls: Mutex::new(JoinSet::new()),
        }
    }

    pub fn multiplexer(&self) -> &Multiplexer {
        &self.mux
    }

    /// Cancelled when the session closes
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Handle a frame from the client.
    pub async fn on_client_frame(&self, frame: Vec<u8>) {
        let Some(call) = InboundCall::parse(&frame) else {
            self.forward(&self.upstream, TO_UPSTREAM, frame).await;
            return;
        };

        match self.gateway.registry().lookup(&call.method).await {
            Ok(handler) => self.spawn_call(handler, call),
            Err(_) if self.gateway.options().forward_unknown_methods => {
                self.forward(&self.upstream, TO_UPSTREAM, frame).await;
            }
            Err(error) => {
                let reply = call.reply(&Err(error));
                write_reply(&self.client, &reply).await;
            }
        }
    }

    /// Handle a frame from the upstream: a reply to one of our steps, or client traffic.
    /// Late replies to steps of a call that already finished are dropped.
    pub async fn on_upstream_frame(&self, frame: Vec<u8>) {
        if let Routed::PassThrough(frame) = self.mux.route_inbound(frame) {
            self.forward(&self.client, TO_CLIENT, frame).await;
        }
    }

    /// Calls still running
    pub fn in_flight(&self) -> usize {
        let mut calls = self.calls.lock();
        while calls.try_join_next().is_some() {}
        calls.len()
    }

    /// Tear the session down: cancel running calls (they send no reply), abandon pending
    /// waits and wait for every call task to finish.
    pub async fn close(&self) {
        self.token.cancel();
        let abandoned_waits = self.mux.close();

        let mut calls = std::mem::take(&mut *self.calls.lock());
        let in_flight_calls = calls.len();
        while calls.join_next().await.is_some() {}

        SessionClosed {
            in_flight_calls,
            abandoned_waits,
        }
        .log();
    }

    fn spawn_call(&self, handler: Arc<CompiledHandler>, call: InboundCall) {
        let mut dispatcher = Dispatcher::new(self.mux.clone(), Arc::clone(&self.upstream));
        if let Some(http) = self.gateway.http() {
            dispatcher = dispatcher.with_http(Arc::clone(http));
        }
        let client = Arc::clone(&self.client);
        let token = self.token.child_token();
        let timeout = self.gateway.options().timeout();

        let mut calls = self.calls.lock();
        while calls.try_join_next().is_some() {}
        calls.spawn(async move {
            let outcome = handler
                .invoke(&call.params, &dispatcher, &token, timeout)
                .await;

            if matches!(&outcome, Err(error) if error.is_cancellation()) {
                ReplySuppressed {
                    method: &call.method,
                }
                .log();
                return;
            }
            write_reply(&client, &call.reply(&outcome)).await;
        });
    }

    async fn forward(&self, sink: &Arc<dyn FrameSink>, direction: &str, frame: Vec<u8>) {
        let bytes = frame.len();
        match sink.send_frame(frame).await {
            Ok(()) => PassThroughForwarded { direction, bytes }.log(),
            Err(error) => FrameWriteFailed {
                target: direction,
                error: &error,
            }
            .log(),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.token.cancel();
        self.mux.close();
    }
}

async fn write_reply(client: &Arc<dyn FrameSink>, reply: &crate::connection::Envelope) {
    let frame = match reply.to_bytes() {
        Ok(frame) => frame,
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize reply envelope");
            return;
        }
    };
    if let Err(error) = client.send_frame(frame).await {
        FrameWriteFailed {
            target: TO_CLIENT,
            error: &error,
        }
        .log();
    }
}
