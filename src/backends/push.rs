// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::backends::response::{decode, normalize, upstream_error, FieldFilter};
use crate::backends::template::StepTemplate;
use crate::config::consts::{CORRELATION_FIELD, ERROR_FIELD, PUSH_DATA_FIELD};
use crate::errors::InvocationError;
use crate::traits::{BackendKind, OutboundRequest, ParsedResponse, StepProcessor};
use serde_json::{Map, Value};

/// Step pushed as a JSON frame over the shared upstream connection.
///
/// The rendered template must be a JSON object; the correlation id is written into its
/// reserved field so the reply can be routed back to this step's waiter.
///
/// Replies are frames too. A non-null `error` member is an upstream error. Otherwise the
/// response body is the `data` member, or the whole frame minus the correlation field
/// when there is no `data`.
#[derive(Debug)]
pub struct PushStepProcessor {
    name: String,
    template: StepTemplate,
    filter: FieldFilter,
}

impl PushStepProcessor {
    pub fn new(name: String, template: StepTemplate, filter: FieldFilter) -> Self {
        Self {
            name,
            template,
            filter,
        }
    }
}

impl StepProcessor for PushStepProcessor {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Push
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

        let rendered = self
            .template
            .render(correlation_id, params, deps)
            .map_err(render_err)?;

        let mut frame = match serde_json::from_str::<Value>(&rendered) {
            Ok(Value::Object(frame)) => frame,
            Ok(_) => return Err(render_err("push template must render a JSON object".to_string())),
            Err(e) => return Err(render_err(format!("rendered frame is not valid JSON: {e}"))),
        };
        frame.insert(
            CORRELATION_FIELD.to_string(),
            Value::String(correlation_id.to_string()),
        );

        serde_json::to_vec(&frame)
            .map(OutboundRequest::Push)
            .map_err(|e| render_err(e.to_string()))
    }

    fn parse(&self, raw: &[u8]) -> Result<ParsedResponse, InvocationError> {
        let mut frame = match decode(&self.name, raw)? {
            Value::Object(frame) => frame,
            other => {
                return Err(InvocationError::Parse {
                    step: self.name.clone(),
                    reason: format!("expected a JSON object frame, got {other}"),
                })
            }
        };

        if let Some(error) = frame.get(ERROR_FIELD).filter(|e| !e.is_null()) {
            return Err(InvocationError::Upstream {
                step: self.name.clone(),
                error: upstream_error(error),
            });
        }

        let body = match frame.remove(PUSH_DATA_FIELD) {
            Some(data) => normalize(data),
            None => {
                frame.remove(CORRELATION_FIELD);
                frame.remove(ERROR_FIELD);
                frame
            }
        };
        let fields = self.filter.apply(&self.name, &body);

        Ok(ParsedResponse { body, fields })
    }
}
