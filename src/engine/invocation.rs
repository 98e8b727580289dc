// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The per-invocation driver.
//!
//! Steps are visited in compiled order. A step is rendered and dispatched as soon as all
//! of its declared dependencies have merged, so independent steps are in flight at the
//! same time. Between dispatch rounds the driver waits for the next step to complete.
//! The first error or a cancellation stops dispatching; the composer then joins whatever
//! is still in flight and reports the outcome.

use crate::config::consts::{codes, ERROR_FIELD};
use crate::connection::{CorrelationId, Multiplexer};
use crate::engine::composer::Composer;
use crate::engine::handler::{CompiledHandler, StepPlan};
use crate::errors::{InvocationError, TransportError};
use crate::observability::messages::{
    engine::{InvocationCompleted, InvocationFailed, InvocationStarted, StepDispatched},
    StructuredLog,
};
use crate::traits::{BackendKind, FrameSink, HttpTransport, OutboundRequest};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Where an invocation's backend requests go.
///
/// Push steps share one upstream connection: frames are written to `upstream` and
/// replies come back through `mux`. HTTP steps each use `http`.
#[derive(Clone)]
pub struct Dispatcher {
    pub mux: Multiplexer,
    pub upstream: Arc<dyn FrameSink>,
    pub http: Option<Arc<dyn HttpTransport>>,
}

impl Dispatcher {
    pub fn new(mux: Multiplexer, upstream: Arc<dyn FrameSink>) -> Self {
        Self {
            mux,
            upstream,
            http: None,
        }
    }

    pub fn with_http(mut self, http: Arc<dyn HttpTransport>) -> Self {
        self.http = Some(http);
        self
    }
}

pub(crate) async fn run(
    handler: &CompiledHandler,
    params: &Value,
    dispatcher: &Dispatcher,
    cancel: &CancellationToken,
    timeout: Option<Duration>,
) -> Result<Map<String, Value>, InvocationError> {
    let started = InvocationStarted {
        method: handler.method(),
        step_count: handler.steps().len(),
    };
    let span = started.span("invoke");
    started.log();

    let began = Instant::now();
    let outcome = drive(handler, params, dispatcher, cancel, timeout)
        .instrument(span)
        .await;

    match &outcome {
        Ok(fields) => InvocationCompleted {
            method: handler.method(),
            field_count: fields.len(),
            elapsed: began.elapsed(),
        }
        .log(),
        Err(error) => InvocationFailed {
            method: handler.method(),
            error,
            elapsed: began.elapsed(),
        }
        .log(),
    }
    outcome
}

async fn drive(
    handler: &CompiledHandler,
    params: &Value,
    dispatcher: &Dispatcher,
    cancel: &CancellationToken,
    timeout: Option<Duration>,
) -> Result<Map<String, Value>, InvocationError> {
    let params = handler.validator().validate(params)?;
    let steps = handler.steps();

    let mut composer = Composer::new(cancel, timeout);
    let mut dispatched = vec![false; steps.len()];
    let mut completed: HashSet<String> = HashSet::new();
    let mut in_flight = 0usize;

    'dispatch: loop {
        for (index, plan) in steps.iter().enumerate() {
            if composer.is_cancelled() {
                composer.fail(InvocationError::Cancelled).await;
                break 'dispatch;
            }
            if dispatched[index] || !plan.depends_on.iter().all(|d| completed.contains(d)) {
                continue;
            }
            dispatched[index] = true;

            if let Err(error) = dispatch(plan, &params, &mut composer, dispatcher).await {
                composer.fail(error).await;
                break 'dispatch;
            }
            in_flight += 1;
        }

        if in_flight == 0 {
            if dispatched.iter().any(|d| !d) {
                composer
                    .fail(InvocationError::Internal(
                        "steps left with unsatisfiable dependencies".to_string(),
                    ))
                    .await;
            }
            break;
        }

        match composer.next_completed().await {
            Some(step) => {
                completed.insert(step);
                in_flight -= 1;
            }
            None => {
                // Cancelled or failed; the latched error, if any, takes precedence.
                composer.fail(InvocationError::Cancelled).await;
                break;
            }
        }
    }

    composer.compose().await
}

async fn dispatch(
    plan: &StepPlan,
    params: &Map<String, Value>,
    composer: &mut Composer,
    dispatcher: &Dispatcher,
) -> Result<(), InvocationError> {
    let processor = &plan.processor;
    let step = processor.name().to_string();
    let deps = composer.dependency_view(&plan.depends_on).await;

    match processor.kind() {
        BackendKind::Push => {
            let pending = dispatcher.mux.await_response();
            let frame = match processor.render(pending.id().as_str(), params, &deps)? {
                OutboundRequest::Push(frame) => frame,
                OutboundRequest::Http(_) => {
                    return Err(InvocationError::Internal(format!(
                        "push step '{step}' rendered an HTTP request"
                    )))
                }
            };

            StepDispatched {
                step: &step,
                kind: BackendKind::Push.as_str(),
                correlation_id: pending.id().as_str(),
            }
            .log();

            let sent = tokio::select! {
                biased;
                _ = composer.token().cancelled() => Err(InvocationError::Cancelled),
                sent = dispatcher.upstream.send_frame(frame) => sent.map_err(|e| transport_error(&step, e)),
            };
            sent?;
            composer.wait(Arc::clone(processor), pending);
        }
        BackendKind::Http => {
            let correlation_id = CorrelationId::new();
            let request = match processor.render(correlation_id.as_str(), params, &deps)? {
                OutboundRequest::Http(request) => request,
                OutboundRequest::Push(_) => {
                    return Err(InvocationError::Internal(format!(
                        "http step '{step}' rendered a push frame"
                    )))
                }
            };
            let transport = dispatcher
                .http
                .clone()
                .ok_or_else(|| transport_error(&step, TransportError::NoUpstream("http")))?;

            StepDispatched {
                step: &step,
                kind: BackendKind::Http.as_str(),
                correlation_id: correlation_id.as_str(),
            }
            .log();

            composer.wait_on(Arc::clone(processor), async move {
                Ok(match transport.execute(request).await {
                    Ok(body) => body,
                    Err(error) => unavailable_body(&error),
                })
            });
        }
    }
    Ok(())
}

fn transport_error(step: &str, error: TransportError) -> InvocationError {
    InvocationError::Transport {
        step: step.to_string(),
        reason: error.to_string(),
    }
}

/// Response body standing in for an HTTP backend that could not be reached, so the
/// failure flows through the step's normal error parsing.
fn unavailable_body(error: &TransportError) -> Vec<u8> {
    json!({
        ERROR_FIELD: {
            "code": codes::BACKEND_UNAVAILABLE,
            "message": error.to_string(),
        }
    })
    .to_string()
    .into_bytes()
}
