// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::ParamSpec;
use crate::errors::{CompileError, InvocationError, ValidationErrors};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

const MISSING: &str = "missing";
const NOT_ALLOWED: &str = "not allowed";
/// Field name used when `params` itself is not an object
const PARAMS_FIELD: &str = "params";

/// Primitive kinds a parameter can be declared as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Boolean,
}

impl ParamKind {
    pub fn parse(declared: &str) -> Option<Self> {
        match declared {
            "string" => Some(ParamKind::String),
            "number" => Some(ParamKind::Number),
            "boolean" | "bool" => Some(ParamKind::Boolean),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Number => "number",
            ParamKind::Boolean => "boolean",
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            ParamKind::String => value.is_string(),
            ParamKind::Number => value.is_number(),
            ParamKind::Boolean => value.is_boolean(),
        }
    }
}

/// Checks an invocation's parameters against the method's declared schema.
///
/// Every problem is collected: missing fields, fields the schema doesn't know, and
/// fields of the wrong kind. Nothing is dispatched unless validation passes.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    schema: BTreeMap<String, ParamKind>,
}

impl Validator {
    /// Build a validator from declared parameter types. Unknown type names are rejected.
    pub fn compile(
        method: &str,
        params: &BTreeMap<String, ParamSpec>,
    ) -> Result<Self, Vec<CompileError>> {
        let mut schema = BTreeMap::new();
        let mut errors = Vec::new();

        for (field, spec) in params {
            match ParamKind::parse(&spec.kind) {
                Some(kind) => {
                    schema.insert(field.clone(), kind);
                }
                None => errors.push(CompileError::UnsupportedParamType {
                    method: method.to_string(),
                    field: field.clone(),
                    declared: spec.kind.clone(),
                }),
            }
        }

        if errors.is_empty() {
            Ok(Self { schema })
        } else {
            Err(errors)
        }
    }

    /// Validate `params` and return them as a map. `null` counts as no parameters.
    pub fn validate(&self, params: &Value) -> Result<Map<String, Value>, InvocationError> {
        let params = match params {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            _ => {
                let mut errors = ValidationErrors::new();
                errors.add(PARAMS_FIELD, "wrong type: expected object");
                return Err(InvocationError::Validation(errors));
            }
        };

        let mut errors = ValidationErrors::new();
        for (field, kind) in &self.schema {
            match params.get(field) {
                None => errors.add(field, MISSING),
                Some(value) if !kind.matches(value) => {
                    errors.add(field, format!("wrong type: expected {}", kind.as_str()))
                }
                Some(_) => {}
            }
        }
        for field in params.keys() {
            if !self.schema.contains_key(field) {
                errors.add(field, NOT_ALLOWED);
            }
        }

        if errors.is_empty() {
            Ok(params)
        } else {
            Err(InvocationError::Validation(errors))
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &ParamKind)> {
        self.schema.iter()
    }
}
