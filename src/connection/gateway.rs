// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::InvocationOptions;
use crate::connection::Session;
use crate::engine::MethodRegistry;
use crate::traits::{FrameSink, HttpTransport};
use std::sync::Arc;

/// Process-wide gateway state shared by every session.
#[derive(Clone)]
pub struct Gateway {
    registry: Arc<MethodRegistry>,
    http: Option<Arc<dyn HttpTransport>>,
    options: InvocationOptions,
}

impl Gateway {
    pub fn new(registry: Arc<MethodRegistry>, options: InvocationOptions) -> Self {
        Self {
            registry,
            http: None,
            options,
        }
    }

    pub fn with_http_transport(mut self, http: Arc<dyn HttpTransport>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn registry(&self) -> &Arc<MethodRegistry> {
        &self.registry
    }

    pub fn http(&self) -> Option<&Arc<dyn HttpTransport>> {
        self.http.as_ref()
    }

    pub fn options(&self) -> &InvocationOptions {
        &self.options
    }

    /// Start a session for one client connection.
    ///
    /// `client` writes to the client; `upstream` writes to the push upstream that serves
    /// this client.
    pub fn session(&self, client: Arc<dyn FrameSink>, upstream: Arc<dyn FrameSink>) -> Session {
        Session::new(self.clone(), client, upstream)
    }
}
