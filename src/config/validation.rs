// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structural validation of a method's backend steps.
//!
//! Checks run in a fixed order so messages stay meaningful:
//!
//! 1. **Naming**: method and step names are non-empty, step names are unique
//! 2. **Targets**: every step has exactly one backend target (`push` or `http`)
//! 3. **References**: every `depends_on` entry names a step of the same method
//! 4. **Cycles**: DFS over the dependency graph (only when 1-3 passed, since cycle
//!    detection needs a structurally valid graph)
//!
//! Errors from stages 1-3 are accumulated so a config author sees all of them at once.
//! Template syntax and parameter types are checked when the handler is compiled.

use crate::config::{CallSpec, DependencyGraph};
use crate::errors::CompileError;
use crate::observability::messages::{config::CompileRejected, StructuredLog};
use std::collections::HashSet;

/// Validate a call spec and return its step execution order.
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Step names in a valid topological order
/// * `Err(Vec<CompileError>)` - All structural problems found
pub fn validate_call_spec(spec: &CallSpec) -> Result<Vec<String>, Vec<CompileError>> {
    let mut errors = Vec::new();

    if spec.method.trim().is_empty() {
        errors.push(CompileError::EmptyMethodName);
    }
    errors.extend(validate_step_names(spec));
    errors.extend(validate_backend_targets(spec));
    errors.extend(validate_dependency_references(spec));

    if !errors.is_empty() {
        log_rejected(spec, &errors);
        return Err(errors);
    }

    DependencyGraph::from_steps(&spec.backend)
        .topological_order()
        .map_err(|cycle| {
            let errors = vec![CompileError::CyclicDependency {
                method: spec.method.clone(),
                cycle,
            }];
            log_rejected(spec, &errors);
            errors
        })
}

fn log_rejected(spec: &CallSpec, errors: &[CompileError]) {
    for error in errors {
        CompileRejected {
            method: &spec.method,
            error,
        }
        .log();
    }
}

/// Step names must be non-empty and unique within the method.
fn validate_step_names(spec: &CallSpec) -> Vec<CompileError> {
    let mut seen = HashSet::new();
    let mut errors = Vec::new();

    for step in &spec.backend {
        if step.name.trim().is_empty() {
            errors.push(CompileError::EmptyStepName {
                method: spec.method.clone(),
            });
        } else if !seen.insert(step.name.as_str()) {
            errors.push(CompileError::DuplicateStepName {
                method: spec.method.clone(),
                step: step.name.clone(),
            });
        }
    }

    errors
}

fn validate_backend_targets(spec: &CallSpec) -> Vec<CompileError> {
    spec.backend
        .iter()
        .filter_map(|step| match (&step.push, &step.http) {
            (Some(_), Some(_)) => Some(CompileError::AmbiguousBackend {
                method: spec.method.clone(),
                step: step.name.clone(),
            }),
            (None, None) => Some(CompileError::MissingBackend {
                method: spec.method.clone(),
                step: step.name.clone(),
            }),
            _ => None,
        })
        .collect()
}

fn validate_dependency_references(spec: &CallSpec) -> Vec<CompileError> {
    let names: HashSet<&str> = spec.backend.iter().map(|s| s.name.as_str()).collect();

    spec.backend
        .iter()
        .flat_map(|step| {
            step.depends_on
                .iter()
                .filter(|dependency| !names.contains(dependency.as_str()))
                .map(|dependency| CompileError::UnresolvedDependency {
                    method: spec.method.clone(),
                    step: step.name.clone(),
                    missing_dependency: dependency.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendStepSpec, HttpTarget, PushTarget};

    fn push_step(name: &str, depends_on: Vec<&str>) -> BackendStepSpec {
        BackendStepSpec {
            name: name.to_string(),
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
            template: "{}".to_string(),
            push: Some(PushTarget {}),
            ..Default::default()
        }
    }

    fn spec(steps: Vec<BackendStepSpec>) -> CallSpec {
        CallSpec {
            method: "test".to_string(),
            params: Default::default(),
            backend: steps,
        }
    }

    #[test]
    fn test_valid_empty_spec() {
        assert_eq!(validate_call_spec(&spec(vec![])).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_valid_linear_chain() {
        let order = validate_call_spec(&spec(vec![
            push_step("c", vec!["b"]),
            push_step("b", vec!["a"]),
            push_step("a", vec![]),
        ]))
        .unwrap();
        assert_eq!(order, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_step_names() {
        let errors = validate_call_spec(&spec(vec![push_step("a", vec![]), push_step("a", vec![])]))
            .unwrap_err();
        assert_eq!(
            errors,
            vec![CompileError::DuplicateStepName {
                method: "test".to_string(),
                step: "a".to_string(),
            }]
        );
    }

    #[test]
    fn test_empty_names() {
        let mut empty_method = spec(vec![push_step("", vec![])]);
        empty_method.method = String::new();

        let errors = validate_call_spec(&empty_method).unwrap_err();
        assert!(errors.contains(&CompileError::EmptyMethodName));
        assert!(errors
            .iter()
            .any(|e| matches!(e, CompileError::EmptyStepName { .. })));
    }

    #[test]
    fn test_unresolved_dependency() {
        let errors = validate_call_spec(&spec(vec![
            push_step("a", vec![]),
            push_step("b", vec!["nonexistent"]),
        ]))
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            CompileError::UnresolvedDependency { missing_dependency, .. } if missing_dependency == "nonexistent"
        ));
    }

    #[test]
    fn test_backend_target_must_be_exclusive() {
        let mut both = push_step("both", vec![]);
        both.http = Some(HttpTarget {
            method: "GET".to_string(),
            url: "http://example".to_string(),
            headers: Default::default(),
        });
        let mut neither = push_step("neither", vec![]);
        neither.push = None;

        let errors = validate_call_spec(&spec(vec![both, neither])).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(&errors[0], CompileError::AmbiguousBackend { step, .. } if step == "both"));
        assert!(matches!(&errors[1], CompileError::MissingBackend { step, .. } if step == "neither"));
    }

    #[test]
    fn test_simple_cycle() {
        let errors = validate_call_spec(&spec(vec![push_step("a", vec!["b"]), push_step("b", vec!["a"])]))
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], CompileError::CyclicDependency { .. }));
    }

    #[test]
    fn test_cycle_detection_skipped_when_references_broken() {
        let errors = validate_call_spec(&spec(vec![
            push_step("a", vec!["b"]),
            push_step("b", vec!["a", "missing"]),
        ]))
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], CompileError::UnresolvedDependency { .. }));
    }

    #[test]
    fn test_multiple_errors() {
        let errors = validate_call_spec(&spec(vec![
            push_step("a", vec!["nonexistent"]),
            push_step("a", vec![]),
            push_step("b", vec!["missing"]),
        ]))
        .unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
