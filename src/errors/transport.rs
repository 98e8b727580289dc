// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Failures writing to a physical connection or reaching an HTTP backend
#[derive(Error, Debug)]
pub enum TransportError {
    /// The peer side of a frame sink is gone
    #[error("Connection closed")]
    Closed,

    #[error("Invalid HTTP request: {0}")]
    InvalidRequest(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No {0} upstream configured")]
    NoUpstream(&'static str),
}
