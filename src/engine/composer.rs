// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Concurrent composition of step responses into one invocation result.
//!
//! Each dispatched step gets a wait task. A task either parses its response and merges
//! the filtered fields into the shared result, or latches an error. The first error wins:
//! latching cancels the invocation token so every sibling task finishes promptly, and
//! later errors are discarded.

use crate::connection::PendingResponse;
use crate::errors::InvocationError;
use crate::observability::messages::{
    engine::{ErrorDiscarded, FieldCollision, StepCompleted},
    StructuredLog,
};
use crate::traits::StepProcessor;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct ComposeState {
    merged: Map<String, Value>,
    by_step: HashMap<String, Map<String, Value>>,
    error: Option<InvocationError>,
}

/// Per-invocation composer.
///
/// Owns the invocation's cancellation token (a child of the caller's), the wait tasks,
/// and the optional deadline watcher. Dropping it cancels everything still running.
pub struct Composer {
    token: CancellationToken,
    state: Arc<Mutex<ComposeState>>,
    tasks: JoinSet<()>,
    completed_tx: mpsc::UnboundedSender<String>,
    completed_rx: mpsc::UnboundedReceiver<String>,
    deadline: Option<JoinHandle<()>>,
}

impl Composer {
    pub fn new(parent: &CancellationToken, timeout: Option<Duration>) -> Self {
        let token = parent.child_token();
        let state = Arc::new(Mutex::new(ComposeState::default()));
        let (completed_tx, completed_rx) = mpsc::unbounded_channel();

        let deadline = timeout.map(|timeout| {
            let token = token.clone();
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => {}
                    _ = tokio::time::sleep(timeout) => {
                        latch(&state, &token, InvocationError::DeadlineExceeded(timeout)).await;
                    }
                }
            })
        });

        Self {
            token,
            state,
            tasks: JoinSet::new(),
            completed_tx,
            completed_rx,
            deadline,
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Await a multiplexed response for `processor`'s step.
    pub fn wait(&mut self, processor: Arc<dyn StepProcessor>, mut pending: PendingResponse) {
        self.wait_on(processor, async move { pending.recv().await });
    }

    /// Await any response future for `processor`'s step.
    pub fn wait_on<F>(&mut self, processor: Arc<dyn StepProcessor>, response: F)
    where
        F: Future<Output = Result<Vec<u8>, InvocationError>> + Send + 'static,
    {
        let token = self.token.clone();
        let state = Arc::clone(&self.state);
        let completed = self.completed_tx.clone();

        self.tasks.spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = token.cancelled() => Err(InvocationError::Cancelled),
                raw = response => raw.and_then(|raw| processor.parse(&raw)),
            };

            match outcome {
                Ok(parsed) => {
                    if merge(&state, processor.name(), parsed.fields).await {
                        // Unread once the driver has dispatched every step.
                        let _ = completed.send(processor.name().to_string());
                    }
                }
                Err(error) => latch(&state, &token, error).await,
            }
        });
    }

    /// Wait for the next step to merge its fields.
    ///
    /// Returns `None` once the invocation is cancelled or has latched an error.
    pub async fn next_completed(&mut self) -> Option<String> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            step = self.completed_rx.recv() => step,
        }
    }

    /// Filtered fields of each named step that has completed, keyed by step name.
    pub async fn dependency_view(&self, steps: &[String]) -> Map<String, Value> {
        let state = self.state.lock().await;
        steps
            .iter()
            .filter_map(|step| {
                state
                    .by_step
                    .get(step)
                    .map(|fields| (step.clone(), Value::Object(fields.clone())))
            })
            .collect()
    }

    /// Latch an error raised outside a wait task (render or send failure).
    pub async fn fail(&self, error: InvocationError) {
        latch(&self.state, &self.token, error).await;
    }

    /// Join every wait task and return the merged fields, or the first latched error.
    pub async fn compose(mut self) -> Result<Map<String, Value>, InvocationError> {
        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    self.fail(InvocationError::Internal(format!("wait task panicked: {e}")))
                        .await;
                }
            }
        }
        if let Some(deadline) = self.deadline.take() {
            deadline.abort();
        }

        let mut state = self.state.lock().await;
        match state.error.take() {
            Some(error) => Err(error),
            None => Ok(std::mem::take(&mut state.merged)),
        }
    }
}

impl Drop for Composer {
    fn drop(&mut self) {
        self.token.cancel();
        if let Some(deadline) = self.deadline.take() {
            deadline.abort();
        }
    }
}

/// Merge a step's fields. Returns `false` if an error was latched first.
async fn merge(state: &Mutex<ComposeState>, step: &str, fields: Map<String, Value>) -> bool {
    let mut state = state.lock().await;
    if state.error.is_some() {
        return false;
    }

    let field_count = fields.len();
    for (field, value) in &fields {
        if state.merged.insert(field.clone(), value.clone()).is_some() {
            FieldCollision { step, field }.log();
        }
    }
    state.by_step.insert(step.to_string(), fields);

    StepCompleted { step, field_count }.log();
    true
}

async fn latch(state: &Mutex<ComposeState>, token: &CancellationToken, error: InvocationError) {
    let mut state = state.lock().await;
    if state.error.is_none() {
        state.error = Some(error);
        token.cancel();
    } else {
        ErrorDiscarded { error: &error }.log();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::stub::StubProcessor;
    use crate::connection::Multiplexer;
    use crate::errors::StructuredApiError;
    use serde_json::json;
    use std::time::Instant;

    fn stub(name: &str) -> Arc<dyn StepProcessor> {
        Arc::new(StubProcessor::new(name))
    }

    #[tokio::test]
    async fn merges_independent_steps_in_any_order() {
        for reversed in [false, true] {
            let mux = Multiplexer::new();
            let mut composer = Composer::new(&CancellationToken::new(), None);

            let first = mux.await_response();
            let second = mux.await_response();
            let (id1, id2) = (first.id().clone(), second.id().clone());
            composer.wait(stub("a"), first);
            composer.wait(stub("b"), second);

            let mut deliveries = vec![
                (id1, br#"{"field1": "value1"}"#.to_vec()),
                (id2, br#"{"field2": "value2"}"#.to_vec()),
            ];
            if reversed {
                deliveries.reverse();
            }
            for (id, payload) in deliveries {
                assert!(mux.deliver(&id, payload));
            }

            let merged = composer.compose().await.unwrap();
            assert_eq!(
                Value::Object(merged),
                json!({"field1": "value1", "field2": "value2"})
            );
        }
    }

    #[tokio::test]
    async fn first_error_wins_and_discards_partial_results() {
        let mux = Multiplexer::new();
        let mut composer = Composer::new(&CancellationToken::new(), None);

        let ok = mux.await_response();
        let failing = mux.await_response();
        let slow = mux.await_response();
        let (ok_id, failing_id) = (ok.id().clone(), failing.id().clone());
        composer.wait(stub("ok"), ok);
        composer.wait(stub("failing"), failing);
        composer.wait(stub("slow"), slow);

        assert!(mux.deliver(&ok_id, br#"{"field1": "value1"}"#.to_vec()));
        assert_eq!(composer.next_completed().await.as_deref(), Some("ok"));
        assert!(mux.deliver(
            &failing_id,
            br#"{"error": {"code": "X", "message": "Y"}}"#.to_vec()
        ));

        let err = composer.compose().await.unwrap_err();
        assert_eq!(err.to_api_error(), StructuredApiError::new("X", "Y"));
        assert_eq!(mux.pending_count(), 0);
    }

    #[tokio::test]
    async fn cancellation_returns_promptly() {
        let mux = Multiplexer::new();
        let caller = CancellationToken::new();
        let mut composer = Composer::new(&caller, None);
        composer.wait(stub("never"), mux.await_response());

        let started = Instant::now();
        let canceller = caller.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = composer.compose().await.unwrap_err();
        assert_eq!(err, InvocationError::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(mux.pending_count(), 0);
    }

    #[tokio::test]
    async fn deadline_latches_deadline_exceeded() {
        let mux = Multiplexer::new();
        let timeout = Duration::from_millis(20);
        let mut composer = Composer::new(&CancellationToken::new(), Some(timeout));
        composer.wait(stub("never"), mux.await_response());

        let err = composer.compose().await.unwrap_err();
        assert_eq!(err, InvocationError::DeadlineExceeded(timeout));
    }

    #[tokio::test]
    async fn collisions_keep_the_last_write() {
        let mut composer = Composer::new(&CancellationToken::new(), None);
        composer.wait_on(stub("a"), async { Ok(br#"{"shared": 1}"#.to_vec()) });
        assert_eq!(composer.next_completed().await.as_deref(), Some("a"));
        composer.wait_on(stub("b"), async { Ok(br#"{"shared": 2}"#.to_vec()) });
        assert_eq!(composer.next_completed().await.as_deref(), Some("b"));

        let merged = composer.compose().await.unwrap();
        assert_eq!(Value::Object(merged), json!({"shared": 2}));
    }

    #[tokio::test]
    async fn dependency_view_exposes_completed_steps() {
        let mut composer = Composer::new(&CancellationToken::new(), None);
        composer.wait_on(stub("profile"), async { Ok(br#"{"id": "u1"}"#.to_vec()) });
        composer.next_completed().await;

        let view = composer
            .dependency_view(&["profile".to_string(), "pending".to_string()])
            .await;
        assert_eq!(Value::Object(view), json!({"profile": {"id": "u1"}}));
    }

    #[tokio::test]
    async fn explicit_failure_stops_next_completed() {
        let mut composer = Composer::new(&CancellationToken::new(), None);
        composer
            .fail(InvocationError::Render {
                step: "s".to_string(),
                reason: "bad".to_string(),
            })
            .await;
        composer.fail(InvocationError::Cancelled).await;

        assert_eq!(composer.next_completed().await, None);
        assert!(matches!(
            composer.compose().await,
            Err(InvocationError::Render { .. })
        ));
    }
}
