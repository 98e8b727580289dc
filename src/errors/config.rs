// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while loading and compiling method configuration.
//!
//! Every variant here is fatal at configuration-load time: a method that fails to
//! compile never becomes callable, and a reload that produces any of these leaves the
//! previously active handler map in place.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while compiling a `CallSpec` into a `CompiledHandler`
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    /// A method was declared with an empty name
    #[error("Method name must not be empty")]
    EmptyMethodName,

    /// Two call specs declare the same method
    #[error("Duplicate method: '{method}'")]
    DuplicateMethod { method: String },

    /// A backend step was declared with an empty name
    #[error("Method '{method}' has a backend step with an empty name")]
    EmptyStepName { method: String },

    /// Two backend steps of one method share a name
    #[error("Method '{method}' declares step '{step}' more than once")]
    DuplicateStepName { method: String, step: String },

    /// A step references a dependency that isn't declared in the same method
    #[error("Step '{step}' of method '{method}' depends on '{missing_dependency}' which does not exist")]
    UnresolvedDependency {
        method: String,
        step: String,
        missing_dependency: String,
    },

    /// A circular dependency was detected among the steps of a method
    #[error("Cyclic dependency detected in method '{method}': {}", .cycle.join(" -> "))]
    CyclicDependency { method: String, cycle: Vec<String> },

    /// A step template (or HTTP url template) failed to parse
    #[error("Template for step '{step}' of method '{method}' is invalid: {reason}")]
    InvalidTemplate {
        method: String,
        step: String,
        reason: String,
    },

    /// A parameter declares a type outside string | number | boolean
    #[error("Parameter '{field}' of method '{method}' has unsupported type '{declared}'")]
    UnsupportedParamType {
        method: String,
        field: String,
        declared: String,
    },

    /// A step declares neither a push nor an http target
    #[error("Step '{step}' of method '{method}' declares no backend target (expected 'push' or 'http')")]
    MissingBackend { method: String, step: String },

    /// A step declares both a push and an http target
    #[error("Step '{step}' of method '{method}' declares both 'push' and 'http' targets")]
    AmbiguousBackend { method: String, step: String },

    #[error("Step '{step}' of method '{method}' uses invalid HTTP method '{http_method}'")]
    InvalidHttpMethod {
        method: String,
        step: String,
        http_method: String,
    },
}

/// Errors that can occur while reading a configuration file
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    /// The file parsed but one or more methods failed to compile
    #[error("Configuration validation failed:\n{}", join_errors(.0))]
    Invalid(Vec<CompileError>),
}

fn join_errors(errors: &[CompileError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
