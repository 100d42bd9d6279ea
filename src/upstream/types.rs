//! Upstream-facing types and error definitions.

use std::fmt;

use axum::http::Method;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::routing::{ArgumentError, OperationId};

/// The API key sent with every upstream call.
///
/// Never printed: `Debug` and `Display` are redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for the outbound header only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential([REDACTED])")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// A fully resolved upstream request. Built fresh per call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestEnvelope {
    pub operation: OperationId,
    pub method: Method,
    /// Base URL joined with the substituted path. Query is kept separately.
    pub url: Url,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// The one way an upstream call fails.
///
/// Covers network failures (DNS, refused connection, timeout) and non-2xx
/// responses alike. `status` is set when the upstream answered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Upstream call failed: {message}")]
pub struct UpstreamError {
    pub status: Option<u16>,
    pub message: String,
}

impl UpstreamError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { status: None, message: message.into() }
    }

    /// A non-2xx answer from upstream.
    pub fn http(status: u16, body: &str) -> Self {
        Self {
            status: Some(status),
            message: format!("HTTP {status} - {body}"),
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(error: reqwest::Error) -> Self {
        Self {
            status: error.status().map(|s| s.as_u16()),
            message: error.to_string(),
        }
    }
}

/// Result type for upstream calls.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Why a call made through [`crate::upstream::UpstreamClient::call`] failed.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CallError {
    /// The arguments did not fit the operation; nothing was sent.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}
