// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use super::http::HttpStepProcessor;
use super::push::PushStepProcessor;
use super::response::FieldFilter;
use super::template::StepTemplate;
use crate::config::BackendStepSpec;
use crate::errors::CompileError;
use crate::traits::StepProcessor;

/// Factory for step processors
pub struct ProcessorFactory;

impl ProcessorFactory {
    /// Create the processor for one backend step of `method`.
    ///
    /// The target decides the variant:
    /// - `http: {method, url, headers}` -> HttpStepProcessor
    /// - otherwise (`push: {}`) -> PushStepProcessor
    ///
    /// Templates are parsed here, so syntax errors surface at configuration load.
    /// Expects a step that passed `validate_call_spec`, which rejects steps with both
    /// targets or neither.
    pub fn create(
        method: &str,
        step: &BackendStepSpec,
    ) -> Result<Arc<dyn StepProcessor>, CompileError> {
        let template_err = |reason: String| CompileError::InvalidTemplate {
            method: method.to_string(),
            step: step.name.clone(),
            reason,
        };
        let filter = FieldFilter::new(step.allow.clone(), step.fields_map.clone());
        let body = StepTemplate::compile(&step.template).map_err(template_err)?;

        let Some(target) = &step.http else {
            return Ok(Arc::new(PushStepProcessor::new(
                step.name.clone(),
                body,
                filter,
            )));
        };

        if reqwest::Method::from_bytes(target.method.to_ascii_uppercase().as_bytes()).is_err() {
            return Err(CompileError::InvalidHttpMethod {
                method: method.to_string(),
                step: step.name.clone(),
                http_method: target.method.clone(),
            });
        }
        let url = StepTemplate::compile(&target.url).map_err(template_err)?;
        Ok(Arc::new(HttpStepProcessor::new(
            step.name.clone(),
            target.method.clone(),
            url,
            target.headers.clone(),
            body,
            filter,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HttpTarget, PushTarget};
    use crate::traits::BackendKind;

    fn step(push: Option<PushTarget>, http: Option<HttpTarget>, template: &str) -> BackendStepSpec {
        BackendStepSpec {
            name: "s".to_string(),
            template: template.to_string(),
            push,
            http,
            ..Default::default()
        }
    }

    fn http_target(method: &str, url: &str) -> HttpTarget {
        HttpTarget {
            method: method.to_string(),
            url: url.to_string(),
            headers: Default::default(),
        }
    }

    #[test]
    fn selects_variant_by_target() {
        let push = ProcessorFactory::create("m", &step(Some(PushTarget {}), None, "{}")).unwrap();
        assert_eq!(push.kind(), BackendKind::Push);
        assert_eq!(push.name(), "s");

        let http = ProcessorFactory::create("m", &step(None, Some(http_target("GET", "http://x")), "")).unwrap();
        assert_eq!(http.kind(), BackendKind::Http);
    }

    #[test]
    fn rejects_bad_templates_and_http_methods() {
        let cases = vec![
            (step(Some(PushTarget {}), None, "{{ oops"), "InvalidTemplate"),
            (step(None, Some(http_target("GET", "{% if %}")), ""), "InvalidTemplate"),
            (step(None, Some(http_target("NOT A METHOD", "http://x")), ""), "InvalidHttpMethod"),
        ];

        for (spec, expected) in cases {
            let err = match ProcessorFactory::create("m", &spec) {
                Ok(_) => panic!("expected {expected}"),
                Err(err) => err,
            };
            let matched = match err {
                CompileError::InvalidTemplate { .. } => "InvalidTemplate",
                CompileError::InvalidHttpMethod { .. } => "InvalidHttpMethod",
                _ => "other",
            };
            assert_eq!(matched, expected);
        }
    }
}
