// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::{Map, Value};
use std::error::Error as _;
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "step";

/// A step template parsed once at compile time and rendered per invocation.
///
/// The render context exposes `params`, `deps` and `correlation_id`. A reference to
/// anything else fails the render.
pub struct StepTemplate {
    tera: Tera,
}

impl StepTemplate {
    /// Parse `source`. Syntax errors are reported with the template engine's message.
    pub fn compile(source: &str) -> Result<Self, String> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, source)
            .map_err(|e| describe(&e))?;
        Ok(Self { tera })
    }

    pub fn render(
        &self,
        correlation_id: &str,
        params: &Map<String, Value>,
        deps: &Map<String, Value>,
    ) -> Result<String, String> {
        let mut ctx = Context::new();
        ctx.insert("params", params);
        ctx.insert("deps", deps);
        ctx.insert("correlation_id", correlation_id);

        self.tera
            .render(TEMPLATE_NAME, &ctx)
            .map_err(|e| describe(&e))
    }
}

impl std::fmt::Debug for StepTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepTemplate").finish_non_exhaustive()
    }
}

// Tera keeps the useful part ("Variable `x` not found") in the source chain.
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
