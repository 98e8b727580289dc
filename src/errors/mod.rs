// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod invocation;
mod transport;

pub use config::{CompileError, LoadError};
pub use invocation::{InvocationError, StructuredApiError, ValidationErrors};
pub use transport::TransportError;
