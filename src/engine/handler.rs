// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::backends::factory::ProcessorFactory;
use crate::config::{validate_call_spec, CallSpec};
use crate::engine::invocation::{self, Dispatcher};
use crate::engine::validator::Validator;
use crate::errors::{CompileError, InvocationError};
use crate::traits::StepProcessor;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// One step of a compiled plan: its processor and the steps it waits for.
#[derive(Clone)]
pub struct StepPlan {
    pub processor: Arc<dyn StepProcessor>,
    pub depends_on: Vec<String>,
}

impl std::fmt::Debug for StepPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepPlan")
            .field("name", &self.processor.name())
            .field("kind", &self.processor.kind())
            .field("depends_on", &self.depends_on)
            .finish()
    }
}

/// A method ready to run: parameter validator plus steps in dependency order.
///
/// Immutable once compiled and shared across concurrent invocations.
#[derive(Debug)]
pub struct CompiledHandler {
    method: String,
    validator: Validator,
    steps: Vec<StepPlan>,
}

impl CompiledHandler {
    /// Compile a call spec, reporting every problem found.
    pub fn compile(spec: &CallSpec) -> Result<Self, Vec<CompileError>> {
        let mut errors = Vec::new();

        let validator = Validator::compile(&spec.method, &spec.params)
            .map_err(|e| errors.extend(e))
            .ok();
        let order = validate_call_spec(spec).map_err(|e| errors.extend(e)).ok();

        let by_name: HashMap<&str, _> = spec.backend.iter().map(|s| (s.name.as_str(), s)).collect();
        let mut steps = Vec::new();
        for name in order.iter().flatten() {
            let Some(step) = by_name.get(name.as_str()) else {
                continue;
            };
            match ProcessorFactory::create(&spec.method, step) {
                Ok(processor) => steps.push(StepPlan {
                    processor,
                    depends_on: step.depends_on.clone(),
                }),
                Err(e) => errors.push(e),
            }
        }

        match validator {
            Some(validator) if errors.is_empty() => Ok(Self {
                method: spec.method.clone(),
                validator,
                steps,
            }),
            _ => Err(errors),
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Steps in execution order
    pub fn steps(&self) -> &[StepPlan] {
        &self.steps
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.processor.name()).collect()
    }

    /// Run one invocation: validate `params`, dispatch every step and compose the result.
    ///
    /// Cancelling `cancel` (or passing `timeout`) ends the invocation promptly with
    /// `Cancelled` (or `DeadlineExceeded`).
    pub async fn invoke(
        &self,
        params: &Value,
        dispatcher: &Dispatcher,
        cancel: &CancellationToken,
        timeout: Option<Duration>,
    ) -> Result<Map<String, Value>, InvocationError> {
        invocation::run(self, params, dispatcher, cancel, timeout).await
    }
}
