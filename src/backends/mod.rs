// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Step processor backends.
//!
//! Each configured backend step becomes a processor implementing [`StepProcessor`]:
//! it renders the outbound request from the invocation's parameters and resolved
//! dependencies, and parses the backend's reply into filtered fields.
//!
//! # Available Backends
//!
//! ## Push
//! Frames written to the shared upstream connection, correlated through the reserved
//! `correlation_id` field:
//! - **Render**: template must produce a JSON object; the correlation id is added
//! - **Parse**: `error` member fails the step, otherwise `data` (or the frame) is the body
//!
//! ## HTTP
//! One request per step, executed by an [`HttpTransport`](crate::traits::HttpTransport):
//! - **Render**: templated URL and body, static headers
//! - **Parse**: a top-level `error` field fails the step
//!
//! ## Stub Backend (Test-Only)
//! Processors, upstreams and HTTP transports for tests. Not available in production
//! builds.
//!
//! # Architecture
//!
//! ```text
//! BackendStepSpec → ProcessorFactory → Arc<dyn StepProcessor> → CompiledHandler
//! ```
//!
//! # Examples
//!
//! ```rust
//! use bffgate::backends::factory::ProcessorFactory;
//! use bffgate::config::{BackendStepSpec, PushTarget};
//! use bffgate::traits::StepProcessor;
//!
//! let step = BackendStepSpec {
//!     name: "profile".to_string(),
//!     template: r#"{"method": "profile.get"}"#.to_string(),
//!     allow: vec!["name".to_string()],
//!     push: Some(PushTarget {}),
//!     ..Default::default()
//! };
//!
//! let processor = ProcessorFactory::create("getProfile", &step)?;
//! assert_eq!(processor.name(), "profile");
//! # Ok::<(), bffgate::errors::CompileError>(())
//! ```
//!
//! [`StepProcessor`]: crate::traits::StepProcessor

pub mod factory;
pub mod http;
pub mod http_transport;
pub mod push;
pub mod response;
#[cfg(test)]
pub mod stub;
pub mod template;

pub use http_transport::ReqwestTransport;
