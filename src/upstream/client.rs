//! HTTP client for the upstream API.
//!
//! # Responsibilities
//! - Attach the `x-api-key` credential header to every call
//! - Issue exactly one outbound request per operation
//! - Relay the decoded JSON body untouched
//! - Collapse every transport or status failure into [`UpstreamError`]
//!
//! # Design Decisions
//! - No retries, no backoff, no timeout override: reqwest defaults apply
//! - One `reqwest::Client` per process, shared behind `Arc` by the server

use std::time::Instant;

use axum::http::{HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::config::schema::UpstreamConfig;
use crate::routing::{endpoint, CallArgs, OperationId};
use crate::upstream::types::{CallError, Credential, RequestEnvelope, UpstreamError, UpstreamResult};

/// Production upstream host.
pub const DEFAULT_BASE_URL: &str = "https://api.oriondrift.net";

const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Client for the upstream REST API.
#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    base_url: Url,
    api_key: HeaderValue,
}

impl UpstreamClient {
    /// Create a client for `base_url`, or the production host when `None`.
    pub fn new(credential: &Credential, base_url: Option<&str>) -> UpstreamResult<Self> {
        Self::build(credential, base_url.unwrap_or(DEFAULT_BASE_URL), Client::builder())
    }

    /// Create a client from validated configuration.
    pub fn from_config(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let credential = config
            .credential
            .as_ref()
            .ok_or_else(|| UpstreamError::new("no credential configured"))?;
        let mut builder = Client::builder();
        if !config.system_proxy {
            builder = builder.no_proxy();
        }
        Self::build(credential, &config.base_url, builder)
    }

    fn build(credential: &Credential, base_url: &str, builder: reqwest::ClientBuilder) -> UpstreamResult<Self> {
        if credential.is_empty() {
            return Err(UpstreamError::new("credential is empty"));
        }
        let base_url = Url::parse(base_url)
            .map_err(|e| UpstreamError::new(format!("invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::new(format!("base URL '{base_url}' cannot carry a path")));
        }
        let mut api_key = HeaderValue::from_str(credential.expose())
            .map_err(|_| UpstreamError::new("credential is not a valid header value"))?;
        api_key.set_sensitive(true);

        let http = builder.build()?;

        tracing::info!(base_url = %base_url, "Upstream client initialized");

        Ok(Self { http, base_url, api_key })
    }

    /// The base URL every path is joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Perform one operation.
    ///
    /// Arguments are bound against the operation's table row first; a binding
    /// failure returns before anything is sent.
    pub async fn call(&self, operation: OperationId, args: CallArgs) -> Result<Value, CallError> {
        let envelope = endpoint(operation).resolve(&self.base_url, &args)?;
        Ok(self.send(envelope).await?)
    }

    /// Send a resolved envelope and decode the response.
    pub async fn send(&self, envelope: RequestEnvelope) -> UpstreamResult<Value> {
        let started = Instant::now();
        let RequestEnvelope { operation, method, url, query, body } = envelope;

        tracing::debug!(
            operation = %operation,
            method = %method,
            path = %url.path(),
            "Calling upstream"
        );

        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(API_KEY_HEADER, self.api_key.clone());
        if !query.is_empty() {
            request = request.query(&query);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(operation = %operation, error = %e, "Upstream unreachable");
                return Err(e.into());
            }
        };

        let status = response.status();
        let text = response.text().await?;

        tracing::debug!(
            operation = %operation,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Upstream responded"
        );

        if !status.is_success() {
            tracing::warn!(operation = %operation, status = status.as_u16(), "Upstream returned error status");
            return Err(UpstreamError::http(status.as_u16(), &text));
        }

        if text.trim().is_empty() {
            return Err(UpstreamError {
                status: Some(status.as_u16()),
                message: format!("HTTP {} - empty response body", status.as_u16()),
            });
        }

        serde_json::from_str(&text).map_err(|e| UpstreamError {
            status: Some(status.as_u16()),
            message: format!("invalid JSON in upstream response: {e}"),
        })
    }
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}
