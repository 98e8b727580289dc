// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Reserved field carrying the correlation id inside push-protocol frames
pub const CORRELATION_FIELD: &str = "correlation_id";
/// Key a JSON array response is wrapped under during normalization
pub const LIST_KEY: &str = "list";
/// Key a scalar JSON response is wrapped under during normalization
pub const VALUE_KEY: &str = "value";
/// Envelope member of a push-protocol frame carrying the response body
pub const PUSH_DATA_FIELD: &str = "data";
/// Member carrying an upstream error, both in push frames and HTTP bodies
pub const ERROR_FIELD: &str = "error";

/// Default HTTP method for `http` steps that don't declare one
pub const DEFAULT_HTTP_METHOD: &str = "POST";

/// Error codes the gateway itself produces (upstream codes are passed through verbatim)
pub mod codes {
    pub const INPUT_VALIDATION_FAILED: &str = "InputValidationFailed";
    pub const NO_SUCH_METHOD: &str = "NoSuchMethod";
    pub const BACKEND_RESPONSE_INVALID: &str = "BackendResponseInvalid";
    pub const TEMPLATE_RENDER_FAILED: &str = "TemplateRenderFailed";
    pub const BACKEND_UNAVAILABLE: &str = "BackendUnavailable";
    pub const CANCELLED: &str = "Cancelled";
    pub const DEADLINE_EXCEEDED: &str = "DeadlineExceeded";
    pub const INTERNAL: &str = "InternalError";
    /// Used when an upstream reports an error as a bare string
    pub const UPSTREAM_ERROR: &str = "UpstreamError";
}
