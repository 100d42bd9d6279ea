//! Upstream API subsystem.
//!
//! # Data Flow
//! ```text
//! OperationId + CallArgs
//!     → routing table (resolve into RequestEnvelope)
//!     → client.rs (x-api-key header, one reqwest call)
//!     → decoded JSON, or UpstreamError
//! ```
//!
//! # Security Constraints
//! - The credential comes only from the environment
//! - The credential is never logged or printed

pub mod client;
pub mod types;

pub use client::{UpstreamClient, DEFAULT_BASE_URL};
pub use types::{CallError, Credential, RequestEnvelope, UpstreamError, UpstreamResult};
