// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::TransportError;
use crate::traits::HttpRequest;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Write side of a physical connection.
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn send_frame(&self, frame: Vec<u8>) -> Result<(), TransportError>;
}

#[async_trait]
impl FrameSink for mpsc::Sender<Vec<u8>> {
    async fn send_frame(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        self.send(frame).await.map_err(|_| TransportError::Closed)
    }
}

#[async_trait]
impl FrameSink for mpsc::UnboundedSender<Vec<u8>> {
    async fn send_frame(&self, frame: Vec<u8>) -> Result<(), TransportError> {
        self.send(frame).map_err(|_| TransportError::Closed)
    }
}

/// Executes one HTTP request and returns the raw response body.
///
/// Non-2xx statuses are not errors here; the body is handed to the step's parser,
/// which decides whether it is an upstream error.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<Vec<u8>, TransportError>;
}
