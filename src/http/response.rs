//! Error responses.
//!
//! # Responsibilities
//! - Map a failed call onto a local HTTP status
//! - Carry the upstream status and message back to the caller
//!
//! # Design Decisions
//! - An upstream 4xx/5xx is relayed with the same status code
//! - An upstream failure without a usable status becomes 502 Bad Gateway
//! - Argument binding failures are 400 Bad Request; nothing was sent upstream

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::routing::OperationId;
use crate::upstream::CallError;

/// Body of every error the gateway returns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    /// `upstream_call_failed` or `invalid_argument`.
    pub error: String,
    pub status: u16,
    pub detail: String,
    pub operation: String,
}

/// A failed call on a local route.
#[derive(Debug)]
pub struct GatewayError {
    pub operation: OperationId,
    pub source: CallError,
}

impl GatewayError {
    pub fn new(operation: OperationId, source: impl Into<CallError>) -> Self {
        Self {
            operation,
            source: source.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match &self.source {
            CallError::Argument(_) => StatusCode::BAD_REQUEST,
            CallError::Upstream(e) => e
                .status
                .filter(|s| (400..600).contains(s))
                .and_then(|s| StatusCode::from_u16(s).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY),
        }
    }

    fn code(&self) -> &'static str {
        match &self.source {
            CallError::Argument(_) => "invalid_argument",
            CallError::Upstream(_) => "upstream_call_failed",
        }
    }

    pub fn body(&self) -> ErrorBody {
        let detail = match &self.source {
            CallError::Argument(e) => e.to_string(),
            CallError::Upstream(e) => e.message.clone(),
        };
        ErrorBody {
            error: self.code().to_string(),
            status: self.status().as_u16(),
            detail,
            operation: self.operation.name().to_string(),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
