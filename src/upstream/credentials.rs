//! Service-to-service credentials injected into upstream requests.
//!
//! # Responsibilities
//! - Hold the client id / client secret pair for the upstream access layer
//! - Attach both as headers to every outbound request
//! - Report presence (never value) for operator diagnostics
//!
//! # Design Decisions
//! - Values are wrapped in [`Secret`], whose `Debug`/`Serialize` output is redacted
//! - Credentials flow one way: config → outbound request headers

use std::fmt;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const REDACTED: &str = "[redacted]";

/// An opaque secret string.
///
/// Only [`Secret::expose`] yields the raw value.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Raw secret value. Only the outbound header path should call this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_present(&self) -> bool {
        !self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl Serialize for Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(REDACTED)
    }
}

impl<'de> Deserialize<'de> for Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Secret)
    }
}

/// Error building credential headers.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("invalid credential header name `{0}`")]
    HeaderName(String),
    /// The header name is reported; the value never is.
    #[error("credential for `{0}` is not a valid header value")]
    HeaderValue(String),
}

/// Pre-built credential headers, ready to merge into outbound requests.
#[derive(Clone)]
pub struct Credentials {
    id_header: HeaderName,
    id_value: HeaderValue,
    secret_header: HeaderName,
    secret_value: HeaderValue,
}

impl Credentials {
    pub fn new(
        id_header: &str,
        client_id: &Secret,
        secret_header: &str,
        client_secret: &Secret,
    ) -> Result<Self, CredentialError> {
        Ok(Self {
            id_header: parse_name(id_header)?,
            id_value: parse_value(id_header, client_id)?,
            secret_header: parse_name(secret_header)?,
            secret_value: parse_value(secret_header, client_secret)?,
        })
    }

    /// Insert both credential headers, replacing any existing values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(self.id_header.clone(), self.id_value.clone());
        headers.insert(self.secret_header.clone(), self.secret_value.clone());
    }

    pub fn header_names(&self) -> [&HeaderName; 2] {
        [&self.id_header, &self.secret_header]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("id_header", &self.id_header)
            .field("secret_header", &self.secret_header)
            .finish_non_exhaustive()
    }
}

fn parse_name(name: &str) -> Result<HeaderName, CredentialError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| CredentialError::HeaderName(name.to_string()))
}

fn parse_value(name: &str, secret: &Secret) -> Result<HeaderValue, CredentialError> {
    let mut value = HeaderValue::from_str(secret.expose())
        .map_err(|_| CredentialError::HeaderValue(name.to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}
