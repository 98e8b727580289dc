// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::CallSpec;
use crate::engine::handler::CompiledHandler;
use crate::errors::{CompileError, InvocationError};
use crate::observability::messages::{config::HandlersUpdated, StructuredLog};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Method name -> compiled handler
pub type HandlerMap = HashMap<String, Arc<CompiledHandler>>;

/// Compile a whole configuration. Any failure rejects all of it.
///
/// Errors from every method are collected, along with duplicate method names.
pub fn compile_all(specs: &[CallSpec]) -> Result<HandlerMap, Vec<CompileError>> {
    let mut handlers = HashMap::new();
    let mut seen = HashSet::new();
    let mut errors = Vec::new();

    for spec in specs {
        if !seen.insert(spec.method.as_str()) {
            errors.push(CompileError::DuplicateMethod {
                method: spec.method.clone(),
            });
            continue;
        }
        match CompiledHandler::compile(spec) {
            Ok(handler) => {
                handlers.insert(spec.method.clone(), Arc::new(handler));
            }
            Err(e) => errors.extend(e),
        }
    }

    if errors.is_empty() {
        Ok(handlers)
    } else {
        Err(errors)
    }
}

/// The active set of methods.
///
/// Readers take a snapshot `Arc` of the whole map, so an invocation keeps the handler it
/// started with even if the map is replaced while it runs. Updates swap the map in one
/// step and never touch a handler in place.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    handlers: RwLock<Arc<HandlerMap>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_handlers(handlers: HandlerMap) -> Self {
        Self {
            handlers: RwLock::new(Arc::new(handlers)),
        }
    }

    /// Find the handler for `method`.
    pub async fn lookup(&self, method: &str) -> Result<Arc<CompiledHandler>, InvocationError> {
        self.handlers
            .read()
            .await
            .get(method)
            .cloned()
            .ok_or_else(|| InvocationError::NoSuchMethod(method.to_string()))
    }

    /// Replace the whole handler map.
    pub async fn update_handlers(&self, handlers: HandlerMap) {
        let method_count = handlers.len();
        *self.handlers.write().await = Arc::new(handlers);
        HandlersUpdated { method_count }.log();
    }

    /// Compile `specs` and swap them in. On any compile error the active map is kept.
    pub async fn reload(&self, specs: &[CallSpec]) -> Result<usize, Vec<CompileError>> {
        let handlers = compile_all(specs)?;
        let count = handlers.len();
        self.update_handlers(handlers).await;
        Ok(count)
    }

    /// Registered method names, sorted
    pub async fn method_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}
