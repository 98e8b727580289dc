// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::{load_and_compile, load_config};
use crate::errors::{CompileError, LoadError};
use std::time::Duration;

/// Test that the profile fixture parses into the expected structure
#[test]
fn test_profile_yaml_loading() {
    let config = load_config("configs/profile.yaml").unwrap();

    assert_eq!(config.invocation.timeout(), Some(Duration::from_secs(10)));
    assert!(!config.invocation.forward_unknown_methods);
    assert_eq!(config.methods.len(), 2);

    let profile = &config.methods[0];
    assert_eq!(profile.method, "getProfile");
    assert_eq!(profile.params["user_id"].kind, "string");
    assert_eq!(profile.params["include_orders"].kind, "bool");
    assert_eq!(profile.backend.len(), 2);
    assert!(profile.backend[0].push.is_some());
    assert_eq!(profile.backend[1].depends_on, vec!["profile"]);

    let http = profile.backend[1].http.as_ref().unwrap();
    assert_eq!(http.method, "GET");
    assert_eq!(http.headers["accept"], "application/json");
}

/// Test compiling every method of a fixture into handlers
#[test]
fn test_profile_yaml_compiles() {
    let (_, handlers) = load_and_compile("configs/profile.yaml").unwrap();

    assert_eq!(handlers.len(), 2);
    assert_eq!(handlers["getProfile"].step_names(), vec!["profile", "org"]);
    assert_eq!(handlers["getSettings"].step_names(), vec!["settings"]);
}

/// Test that the echo fixture orders dependent steps after their dependencies
#[test]
fn test_echo_compose_yaml_orders_steps() {
    let (_, handlers) = load_and_compile("configs/echo-compose.yaml").unwrap();

    assert_eq!(handlers.len(), 7);
    assert_eq!(handlers["chained"].step_names(), vec!["profile", "orders"]);
    assert_eq!(handlers["twoFields"].step_names(), vec!["slow", "fast"]);
}

/// Test that every compile error in a file is reported, and nothing is returned
#[test]
fn test_invalid_yaml_reports_all_errors() {
    let errors = match load_and_compile("configs/invalid-cycle.yaml") {
        Err(LoadError::Invalid(errors)) => errors,
        other => panic!("expected compile errors, got {:?}", other.map(|(_, h)| h.len())),
    };

    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| matches!(
        e,
        CompileError::CyclicDependency { method, cycle } if method == "loops" && cycle.len() == 3
    )));
    assert!(errors.iter().any(|e| matches!(
        e,
        CompileError::AmbiguousBackend { method, step } if method == "confused" && step == "both"
    )));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = load_config("configs/does-not-exist.yaml").unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}
