//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};
use crate::upstream::credentials::Secret;

/// Environment variable carrying the upstream client id.
pub const ENV_CLIENT_ID: &str = "CF_ACCESS_ID";
/// Environment variable carrying the upstream client secret.
pub const ENV_CLIENT_SECRET: &str = "CF_ACCESS_SECRET";
/// Environment variable overriding `upstream.base_url`.
pub const ENV_UPSTREAM_URL: &str = "EDGE_PROXY_UPSTREAM_URL";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
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

/// Parse configuration from TOML text without validating it.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Overlay environment-supplied values onto `config`.
///
/// `lookup` abstracts `std::env::var` so tests can supply their own values.
/// Empty variables are ignored.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(id) = get(ENV_CLIENT_ID) {
        config.credentials.client_id = Secret::new(id);
    }
    if let Some(secret) = get(ENV_CLIENT_SECRET) {
        config.credentials.client_secret = Secret::new(secret);
    }
    if let Some(url) = get(ENV_UPSTREAM_URL) {
        config.upstream.base_url = url;
    }
}

/// Load and validate configuration.
///
/// With `path == None` the built-in defaults are used. Process environment
/// overrides are applied before validation in both cases.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}
