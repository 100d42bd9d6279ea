//! Argument binding: turning caller-supplied values into a request envelope.
//!
//! # Responsibilities
//! - Substitute identifiers into the upstream path template
//! - Coerce raw (query-string) values to each parameter's declared kind
//! - Fill omitted parameters with their documented defaults
//! - Place body-field parameters and the caller's JSON body
//!
//! # Design Decisions
//! - Only declared parameters are forwarded; anything else is rejected
//! - Identifiers are percent-encoded as single path segments
//! - Query pairs keep the declaration order of the endpoint table

use std::collections::HashMap;

use axum::http::Method;
use serde_json::{Map, Value};
use thiserror::Error;
use url::Url;

use crate::routing::table::{placeholder_name, BodyKind, Endpoint, ParamKind, ParamTarget};
use crate::upstream::RequestEnvelope;

/// A parameter value supplied by a caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Str(String),
    /// Unparsed text (e.g. from a query string), coerced against the declared kind.
    Raw(String),
}

impl From<bool> for ParamValue {
    fn from(b: bool) -> Self {
        ParamValue::Bool(b)
    }
}

impl From<i64> for ParamValue {
    fn from(i: i64) -> Self {
        ParamValue::Int(i)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

/// Errors binding caller arguments to an endpoint.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ArgumentError {
    #[error("Missing path parameter '{0}'")]
    MissingPathParam(String),

    #[error("Missing required parameter '{0}'")]
    MissingParam(String),

    #[error("Unknown parameter '{0}'")]
    UnknownParam(String),

    #[error("Invalid value '{value}' for parameter '{name}': expected {expected}")]
    InvalidValue {
        name: String,
        value: String,
        expected: &'static str,
    },

    #[error("Request body is required")]
    MissingBody,

    #[error("Request body is not valid JSON: {0}")]
    MalformedBody(String),

    #[error("Request body must be a JSON object")]
    BodyNotObject,

    #[error("Operation does not accept a request body")]
    UnexpectedBody,

    #[error("Base URL '{0}' cannot carry a path")]
    UnusableBaseUrl(String),
}

/// Arguments for one operation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    path: HashMap<String, String>,
    params: HashMap<String, ParamValue>,
    body: Option<Value>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a path identifier (`user_id`, `station_id`, ...).
    pub fn path(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.path.insert(name.into(), value.into());
        self
    }

    /// Set a typed parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Set a parameter from unparsed text.
    pub fn raw(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), ParamValue::Raw(value.into()));
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Arguments as they arrive on a local route: path captures and query
    /// string values, all unparsed.
    pub fn from_request(path: HashMap<String, String>, query: HashMap<String, String>) -> Self {
        Self {
            path,
            params: query
                .into_iter()
                .map(|(k, v)| (k, ParamValue::Raw(v)))
                .collect(),
            body: None,
        }
    }
}

impl Endpoint {
    /// Resolve `args` against this endpoint into a request envelope rooted at `base_url`.
    pub fn resolve(&self, base_url: &Url, args: &CallArgs) -> Result<RequestEnvelope, ArgumentError> {
        let url = self.upstream_url(base_url, &args.path)?;

        if let Some(unknown) = args.params.keys().find(|k| self.param(k).is_none()) {
            return Err(ArgumentError::UnknownParam(unknown.clone()));
        }

        let mut query = Vec::new();
        let mut fields = Map::new();
        for spec in self.params {
            let value = match args.params.get(spec.name) {
                Some(v) => coerce(spec.name, spec.kind, v)?,
                None => match spec.kind {
                    ParamKind::Bool(b) => Value::Bool(b),
                    ParamKind::Int(i) => Value::from(i),
                    ParamKind::Str => return Err(ArgumentError::MissingParam(spec.name.to_string())),
                },
            };
            match spec.target {
                ParamTarget::Query => query.push((spec.name.to_string(), render(&value))),
                ParamTarget::BodyField => {
                    fields.insert(spec.name.to_string(), value);
                }
            }
        }

        let body = match (self.body, &args.body) {
            (BodyKind::Json, None) => return Err(ArgumentError::MissingBody),
            (BodyKind::Json, Some(Value::Object(map))) => {
                let mut map = map.clone();
                map.extend(fields);
                Some(Value::Object(map))
            }
            (BodyKind::Json, Some(_)) => return Err(ArgumentError::BodyNotObject),
            (BodyKind::None, Some(_)) => return Err(ArgumentError::UnexpectedBody),
            (BodyKind::None, None) if fields.is_empty() => None,
            (BodyKind::None, None) => Some(Value::Object(fields)),
        };

        Ok(RequestEnvelope {
            operation: self.id,
            method: self.method.clone(),
            url,
            query,
            body,
        })
    }

    fn upstream_url(&self, base_url: &Url, path: &HashMap<String, String>) -> Result<Url, ArgumentError> {
        let mut url = base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ArgumentError::UnusableBaseUrl(base_url.to_string()))?;
            segments.pop_if_empty();
            for segment in self.upstream_path.trim_start_matches('/').split('/') {
                match placeholder_name(segment) {
                    Some(name) => {
                        let value = path
                            .get(name)
                            .ok_or_else(|| ArgumentError::MissingPathParam(name.to_string()))?;
                        segments.push(value);
                    }
                    None => {
                        segments.push(segment);
                    }
                }
            }
        }
        Ok(url)
    }

    /// Whether this endpoint's local route carries path identifiers.
    pub fn has_path_params(&self) -> bool {
        self.local_path.contains('{')
    }

    /// The local method and route, filled in with `path` values.
    pub fn local_route(&self, path: &HashMap<String, String>) -> Result<(Method, String), ArgumentError> {
        let mut route = String::new();
        for segment in self.local_path.trim_start_matches('/').split('/') {
            route.push('/');
            match placeholder_name(segment) {
                Some(name) => route.push_str(
                    path.get(name)
                        .ok_or_else(|| ArgumentError::MissingPathParam(name.to_string()))?,
                ),
                None => route.push_str(segment),
            }
        }
        Ok((self.method.clone(), route))
    }

    /// The path values under which this endpoint's local template spells
    /// `route`, or `None` when the shapes differ.
    pub fn match_local(&self, route: &str) -> Option<HashMap<String, String>> {
        let template: Vec<&str> = self.local_path.trim_start_matches('/').split('/').collect();
        let segments: Vec<&str> = route.trim_start_matches('/').split('/').collect();
        if template.len() != segments.len() {
            return None;
        }

        let mut path = HashMap::new();
        for (t, s) in template.iter().zip(&segments) {
            match placeholder_name(t) {
                Some(name) => {
                    path.insert(name.to_string(), s.to_string());
                }
                None if t == s => {}
                None => return None,
            }
        }
        Some(path)
    }
}

fn coerce(name: &str, kind: ParamKind, value: &ParamValue) -> Result<Value, ArgumentError> {
    let invalid = |value: String, expected| ArgumentError::InvalidValue {
        name: name.to_string(),
        value,
        expected,
    };
    match (kind, value) {
        (ParamKind::Bool(_), ParamValue::Bool(b)) => Ok(Value::Bool(*b)),
        (ParamKind::Bool(_), ParamValue::Raw(s)) => parse_bool(s)
            .map(Value::Bool)
            .ok_or_else(|| invalid(s.clone(), "a boolean")),
        (ParamKind::Int(_), ParamValue::Int(i)) => Ok(Value::from(*i)),
        (ParamKind::Int(_), ParamValue::Raw(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid(s.clone(), "an integer")),
        (ParamKind::Str, ParamValue::Str(s) | ParamValue::Raw(s)) => Ok(Value::String(s.clone())),
        (ParamKind::Bool(_), other) => Err(invalid(describe(other), "a boolean")),
        (ParamKind::Int(_), other) => Err(invalid(describe(other), "an integer")),
        (ParamKind::Str, other) => Err(invalid(describe(other), "a string")),
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn describe(value: &ParamValue) -> String {
    match value {
        ParamValue::Bool(b) => b.to_string(),
        ParamValue::Int(i) => i.to_string(),
        ParamValue::Str(s) | ParamValue::Raw(s) => s.clone(),
    }
}

/// Wire form of a query value.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
