// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod dependency_graph;
mod loader;
mod reload;
mod validation;

#[cfg(test)]
mod integration_tests;
pub mod consts;

pub use dependency_graph::DependencyGraph;
pub use loader::{
    load_and_compile, load_config, BackendStepSpec, CallSpec, GatewayConfig, HttpTarget,
    InvocationOptions, ParamSpec, PushTarget,
};
pub use reload::{reload_from, watch_config};
pub use validation::validate_call_spec;
