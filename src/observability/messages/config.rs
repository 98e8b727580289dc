// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for configuration compilation and hot reload.

use crate::errors::CompileError;
use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A method failed to compile.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct CompileRejected<'a> {
    pub method: &'a str,
    pub error: &'a CompileError,
}

impl Display for CompileRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Method '{}' rejected: {}", self.method, self.error)
    }
}

impl StructuredLog for CompileRejected<'_> {
    fn log(&self) {
        tracing::error!(method = self.method, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "compile_rejected",
            span_name = name,
            method = self.method,
        )
    }
}

/// The registry's handler map was replaced.
///
/// # Log Level
/// `info!` - Important operational event
pub struct HandlersUpdated {
    pub method_count: usize,
}

impl Display for HandlersUpdated {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Method registry updated: {} methods active", self.method_count)
    }
}

impl StructuredLog for HandlersUpdated {
    fn log(&self) {
        tracing::info!(method_count = self.method_count, "{}", self);
    }
}

/// A config file was reloaded and swapped in.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use bffgate::observability::messages::config::ConfigReloaded;
///
/// let msg = ConfigReloaded {
///     path: "configs/gateway.yaml",
///     method_count: 4,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ConfigReloaded<'a> {
    pub path: &'a str,
    pub method_count: usize,
}

impl Display for ConfigReloaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Reloaded '{}': {} methods compiled",
            self.path, self.method_count
        )
    }
}

impl StructuredLog for ConfigReloaded<'_> {
    fn log(&self) {
        tracing::info!(path = self.path, method_count = self.method_count, "{}", self);
    }
}

/// A changed config file could not be loaded; the previous handlers stay active.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ReloadRejected<'a> {
    pub path: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ReloadRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Reload of '{}' rejected, keeping active handlers: {}",
            self.path, self.error
        )
    }
}

impl StructuredLog for ReloadRejected<'_> {
    fn log(&self) {
        tracing::error!(path = self.path, error = %self.error, "{}", self);
    }
}
