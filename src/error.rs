//! Error types for request handling.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::routing::InvalidTarget;
use crate::upstream::UpstreamError;

/// Terminal failures of a single inbound request.
///
/// The `Display` text is for operator logs. Callers only ever see the fixed
/// body from [`GatewayError::public_message`].
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Path outside the proxied namespace.
    #[error("no route for path")]
    NotFound,

    /// Inbound body exceeded the configured limit.
    #[error("request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    /// Inbound body stream failed before it was complete.
    #[error("cannot read request body: {0}")]
    BodyRead(String),

    /// Rewritten target URL was not valid.
    #[error(transparent)]
    InvalidTarget(#[from] InvalidTarget),

    /// Outbound call failed before a response arrived.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::BodyRead(_) | GatewayError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            GatewayError::Upstream(UpstreamError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn public_message(&self) -> &'static str {
        match self {
            GatewayError::NotFound => "Not found",
            GatewayError::PayloadTooLarge(_) => "Payload too large",
            GatewayError::BodyRead(_) | GatewayError::InvalidTarget(_) => "Bad request",
            GatewayError::Upstream(UpstreamError::Timeout) => "Upstream request timed out",
            GatewayError::Upstream(_) => "Upstream request failed",
        }
    }

    /// Label used for the `outcome` metric dimension.
    pub fn outcome(&self) -> &'static str {
        match self {
            GatewayError::NotFound => "not_found",
            GatewayError::PayloadTooLarge(_) | GatewayError::BodyRead(_) => "rejected_body",
            GatewayError::InvalidTarget(_) => "invalid_target",
            GatewayError::Upstream(_) => "upstream_error",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status(), self.public_message()).into_response()
    }
}

/// Result type alias for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;
