// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod composer;
pub mod handler;
pub mod invocation;
pub mod registry;
pub mod validator;

pub use composer::Composer;
pub use handler::{CompiledHandler, StepPlan};
pub use invocation::Dispatcher;
pub use registry::{compile_all, HandlerMap, MethodRegistry};
pub use validator::{ParamKind, Validator};
