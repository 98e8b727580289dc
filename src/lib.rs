// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // step processors + transports
pub mod config;     // config loading, validation, reload
pub mod connection; // correlation, envelopes, sessions
pub mod engine;     // compiled handlers + invocation
pub mod errors;     // error handling
pub mod observability;
pub mod traits;     // unified abstractions
