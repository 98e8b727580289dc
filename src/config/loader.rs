// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::DEFAULT_HTTP_METHOD;
use crate::engine::{compile_all, HandlerMap};
use crate::errors::LoadError;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Top-level gateway configuration.
///
/// Holds invocation-wide options and the list of methods the gateway exposes.
/// It is typically loaded from a YAML file; JSON and TOML are accepted too, picked by
/// file extension.
///
/// # Example
/// ```yaml
/// invocation:
///   timeout_seconds: 10
/// methods:
///   - method: getProfile
///     params:
///       user_id: { type: string }
///     backend:
///       - name: profile
///         push: {}
///         template: '{"method": "profile.get", "params": {"id": {{ params.user_id | json_encode() }}}}'
///         allow: [name, email]
///         fields_map: { name: display_name }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub invocation: InvocationOptions,
    #[serde(default)]
    pub methods: Vec<CallSpec>,
}

/// Options applied to every invocation.
///
/// # Fields
/// * `timeout_seconds` - Deadline for a whole invocation (optional, no deadline if unset)
/// * `forward_unknown_methods` - Forward calls for unregistered methods to the upstream
///   as pass-through traffic instead of answering `NoSuchMethod`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvocationOptions {
    pub timeout_seconds: Option<u64>,
    #[serde(default)]
    pub forward_unknown_methods: bool,
}

impl InvocationOptions {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

/// Declarative description of one method: its parameter schema and backend steps.
#[derive(Debug, Clone, Deserialize)]
pub struct CallSpec {
    pub method: String,
    #[serde(default)]
    pub params: BTreeMap<String, ParamSpec>,
    #[serde(default)]
    pub backend: Vec<BackendStepSpec>,
}

/// Declared type of a single parameter. The type string is checked at compile time.
#[derive(Debug, Clone, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub kind: String,
}

/// One backend call within a method.
///
/// Exactly one of `push` or `http` must be set.
///
/// # Fields
/// * `name` - Unique step name within the method; dependents see its output under `deps.<name>`
/// * `depends_on` - Steps whose filtered output must be available before this one renders
/// * `template` - Tera template for the outbound payload (push frame or HTTP body)
/// * `allow` - Response fields copied into the result
/// * `fields_map` - Renames applied to allowed fields (source -> destination)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendStepSpec {
    pub name: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub allow: Vec<String>,
    #[serde(default)]
    pub fields_map: HashMap<String, String>,
    pub push: Option<PushTarget>,
    pub http: Option<HttpTarget>,
}

/// Marker target: the step is pushed over the multiplexed upstream connection
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct PushTarget {}

/// HTTP target. `url` is a template rendered with the same context as the body.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HttpTarget {
    #[serde(default = "default_http_method")]
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_http_method() -> String {
    DEFAULT_HTTP_METHOD.to_string()
}

/// Load a config file. The format follows the extension: `.json`, `.toml`, anything
/// else is read as YAML.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GatewayConfig, LoadError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let cfg = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        Some("toml") => toml::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };
    Ok(cfg)
}

/// Load a config file and compile every method in it.
///
/// All compile errors across all methods are reported together.
pub fn load_and_compile<P: AsRef<Path>>(path: P) -> Result<(GatewayConfig, HandlerMap), LoadError> {
    let cfg = load_config(path)?;
    let handlers = compile_all(&cfg.methods).map_err(LoadError::Invalid)?;
    Ok((cfg, handlers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parse_basic_config() {
        let yaml = r#"
methods:
  - method: getUser
    params:
      user_id: { type: string }
    backend:
      - name: profile
        push: {}
        template: '{"id": {{ params.user_id | json_encode() }}}'
        allow: [name]
      - name: orders
        depends_on: [profile]
        http:
          url: "http://orders.local/users/{{ params.user_id }}"
        allow: [orders]
"#;

        let cfg: GatewayConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.methods.len(), 1);
        let spec = &cfg.methods[0];
        assert_eq!(spec.params["user_id"].kind, "string");
        assert_eq!(spec.backend.len(), 2);
        assert_eq!(spec.backend[0].push, Some(PushTarget {}));
        assert_eq!(spec.backend[1].depends_on, vec!["profile"]);

        let http = spec.backend[1].http.as_ref().unwrap();
        assert_eq!(http.method, "POST");
        assert!(http.headers.is_empty());
        assert!(cfg.invocation.timeout().is_none());
        assert!(!cfg.invocation.forward_unknown_methods);
    }

    #[test]
    fn parse_invocation_options() {
        let yaml = r#"
invocation:
  timeout_seconds: 5
  forward_unknown_methods: true
methods: []
"#;
        let cfg: GatewayConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.invocation.timeout(), Some(Duration::from_secs(5)));
        assert!(cfg.invocation.forward_unknown_methods);
    }

    #[test]
    fn load_config_picks_format_by_extension() {
        let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            json,
            r#"{{"methods": [{{"method": "ping", "backend": [{{"name": "p", "push": {{}}, "template": "{{}}"}}]}}]}}"#
        )
        .unwrap();
        let cfg = load_config(json.path()).unwrap();
        assert_eq!(cfg.methods[0].method, "ping");

        let mut toml_file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            toml_file,
            r#"
[invocation]
timeout_seconds = 3

[[methods]]
method = "ping"

[[methods.backend]]
name = "p"
template = "{{}}"
[methods.backend.push]
"#
        )
        .unwrap();
        let cfg = load_config(toml_file.path()).unwrap();
        assert_eq!(cfg.invocation.timeout_seconds, Some(3));
        assert_eq!(cfg.methods[0].backend[0].push, Some(PushTarget {}));
    }

    #[test]
    fn load_and_compile_reports_cycles() {
        let yaml = r#"
methods:
  - method: loop
    backend:
      - name: a
        depends_on: [b]
        push: {}
      - name: b
        depends_on: [a]
        push: {}
"#;
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let err = load_and_compile(file.path()).unwrap_err();
        assert!(err.to_string().contains("Cyclic dependency detected"));
    }

    #[test]
    fn load_config_missing_file() {
        let err = load_config("does/not/exist.yaml").unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
