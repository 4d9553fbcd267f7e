//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the upstream base URL and proxied prefix are usable
//! - Check origins are bare `scheme://host[:port]` strings
//! - Check credentials are present and header names are valid
//! - Validate value ranges (timeouts > 0, body limit > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Errors name the offending field, never a secret value

use std::net::SocketAddr;

use axum::http::HeaderName;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("listener.max_body_bytes must be greater than zero")]
    MaxBodyBytes,

    #[error("upstream.base_url `{url}` is invalid: {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("upstream.path_prefix `{0}` must start with `/`")]
    PathPrefix(String),

    #[error("cors.allowed_origins must contain at least one origin")]
    NoOrigins,

    #[error("cors.allowed_origins entry `{0}` must be scheme://host[:port] with no path")]
    Origin(String),

    #[error("credentials.{0} is missing")]
    MissingCredential(&'static str),

    #[error("credentials.{field} `{name}` is not a valid header name")]
    CredentialHeader { field: &'static str, name: String },

    #[error("credential header names must differ")]
    DuplicateCredentialHeader,

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("timeouts.upstream_secs must be less than timeouts.request_secs")]
    UpstreamTimeoutTooLong,

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(ValidationError::MaxBodyBytes);
    }

    if let Err(reason) = check_base_url(&config.upstream.base_url) {
        errors.push(ValidationError::BaseUrl {
            url: config.upstream.base_url.clone(),
            reason,
        });
    }
    if !config.upstream.path_prefix.starts_with('/') {
        errors.push(ValidationError::PathPrefix(config.upstream.path_prefix.clone()));
    }

    if config.cors.allowed_origins.is_empty() {
        errors.push(ValidationError::NoOrigins);
    }
    for origin in &config.cors.allowed_origins {
        if !is_bare_origin(origin) {
            errors.push(ValidationError::Origin(origin.clone()));
        }
    }

    let creds = &config.credentials;
    if !creds.client_id.is_present() {
        errors.push(ValidationError::MissingCredential("client_id"));
    }
    if !creds.client_secret.is_present() {
        errors.push(ValidationError::MissingCredential("client_secret"));
    }
    let id_header = HeaderName::from_bytes(creds.client_id_header.as_bytes());
    let secret_header = HeaderName::from_bytes(creds.client_secret_header.as_bytes());
    if id_header.is_err() {
        errors.push(ValidationError::CredentialHeader {
            field: "client_id_header",
            name: creds.client_id_header.clone(),
        });
    }
    if secret_header.is_err() {
        errors.push(ValidationError::CredentialHeader {
            field: "client_secret_header",
            name: creds.client_secret_header.clone(),
        });
    }
    if let (Ok(a), Ok(b)) = (id_header, secret_header) {
        if a == b {
            errors.push(ValidationError::DuplicateCredentialHeader);
        }
    }

    let timeouts = &config.timeouts;
    for (name, value) in [
        ("connect_secs", timeouts.connect_secs),
        ("upstream_secs", timeouts.upstream_secs),
        ("request_secs", timeouts.request_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }
    if timeouts.upstream_secs >= timeouts.request_secs {
        errors.push(ValidationError::UpstreamTimeoutTooLong);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
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
        return Err(format!("unsupported scheme `{}`", url.scheme()));
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("must not carry a query or fragment".to_string());
    }
    Ok(())
}

/// An origin as browsers send it: serializes back to exactly itself.
fn is_bare_origin(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => url.origin().is_tuple() && url.origin().ascii_serialization() == raw,
        Err(_) => false,
    }
}
