//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::upstream::Credential;

/// Required: the upstream API key.
pub const API_KEY_ENV: &str = "ORION_API_KEY";
/// Optional: overrides `upstream.base_url`.
pub const BASE_URL_ENV: &str = "ORION_BASE_URL";
/// Optional: overrides `listener.bind_address`.
pub const BIND_ENV: &str = "GATEWAY_BIND";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file plus the process environment,
/// then validate it.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Like [`load_config`], reading environment values through `env`.
pub fn load_config_with<F>(path: Option<&Path>, env: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => GatewayConfig::default(),
    };
    apply_env(&mut config, env);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse TOML text without validating it.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Overlay environment values onto `config`. Blank values count as unset.
pub fn apply_env<F>(config: &mut GatewayConfig, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

    if let Some(key) = lookup(API_KEY_ENV) {
        config.upstream.credential = Some(Credential::new(key));
    }
    if let Some(url) = lookup(BASE_URL_ENV) {
        config.upstream.base_url = url;
    }
    if let Some(addr) = lookup(BIND_ENV) {
        config.listener.bind_address = addr;
    }
}
