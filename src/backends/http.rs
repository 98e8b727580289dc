// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::backends::response::{decode, normalize, upstream_error, FieldFilter};
use crate::backends::template::StepTemplate;
use crate::config::consts::ERROR_FIELD;
use crate::errors::InvocationError;
use crate::traits::{BackendKind, HttpRequest, OutboundRequest, ParsedResponse, StepProcessor};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Step issued as its own HTTP request.
///
/// Both the URL and the body are templates rendered with the same context. A top-level
/// `error` field in the response body marks an upstream error.
#[derive(Debug)]
pub struct HttpStepProcessor {
    name: String,
    method: String,
    url: StepTemplate,
    headers: BTreeMap<String, String>,
    body: StepTemplate,
    filter: FieldFilter,
}

impl HttpStepProcessor {
    pub fn new(
        name: String,
        method: String,
        url: StepTemplate,
        headers: BTreeMap<String, String>,
        body: StepTemplate,
        filter: FieldFilter,
    ) -> Self {
        Self {
            name,
            method: method.to_ascii_uppercase(),
            url,
            headers,
            body,
            filter,
        }
    }
}

impl StepProcessor for HttpStepProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Http
    }

    fn render(
        &self,
        correlation_id: &str,
        params: &Map<String, Value>,
        deps: &Map<String, Value>,
    ) -> Result<OutboundRequest, InvocationError> {
        let render_err = |reason: String| InvocationError::Render {
            step: self.name.clone(),
            reason,
        };

        let url = self
            .url
            .render(correlation_id, params, deps)
            .map_err(render_err)?;
        let body = self
            .body
            .render(correlation_id, params, deps)
            .map_err(render_err)?;

        Ok(OutboundRequest::Http(HttpRequest {
            method: self.method.clone(),
            url: url.trim().to_string(),
            headers: self.headers.clone(),
            body: body.into_bytes(),
        }))
    }

    fn parse(&self, raw: &[u8]) -> Result<ParsedResponse, InvocationError> {
        // An empty reply (e.g. 204) carries no fields.
        let value = if raw.iter().all(u8::is_ascii_whitespace) {
            Value::Object(Map::new())
        } else {
            decode(&self.name, raw)?
        };

        if let Some(error) = value.get(ERROR_FIELD).filter(|e| !e.is_null()) {
            return Err(InvocationError::Upstream {
                step: self.name.clone(),
                error: upstream_error(error),
            });
        }

        let body = normalize(value);
        let fields = self.filter.apply(&self.name, &body);
        Ok(ParsedResponse { body, fields })
    }
}
