//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Require the credential before anything starts
//! - Validate value ranges and address formats
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::loader::API_KEY_ENV;
use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing credential: set {}", API_KEY_ENV)]
    MissingCredential,

    #[error("invalid upstream base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid bind address '{0}'")]
    InvalidAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

/// Check a loaded configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match &config.upstream.credential {
        Some(c) if !c.is_empty() => {}
        _ => errors.push(ValidationError::MissingCredential),
    }

    if let Err(reason) = check_base_url(&config.upstream.base_url) {
        errors.push(ValidationError::InvalidBaseUrl {
            url: config.upstream.base_url.clone(),
            reason,
        });
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero("security.max_body_size"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_base_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("unsupported scheme '{}'", url.scheme()));
    }
    if url.cannot_be_a_base() {
        return Err("URL cannot carry a path".to_string());
    }
    Ok(())
}
