//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarding handler
//!     → UpstreamRequest (method, target, headers incl. credentials, body)
//!     → Upstream::send (client.rs: one attempt, bounded by timeouts)
//!     → UpstreamResponse (status, headers, full body) or UpstreamError
//! ```
//!
//! # Design Decisions
//! - Single attempt per inbound request; no retry loop
//! - Full response is buffered before relay
//! - `Upstream` is a trait so the gateway can be exercised with a fake

pub mod client;
pub mod credentials;

use std::future::Future;

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use url::Url;

pub use client::HttpUpstream;
pub use credentials::{Credentials, Secret};

/// A fully-formed outbound request.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// A fully-buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Failure before a complete response was received.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// Connect or total deadline elapsed.
    #[error("upstream request timed out")]
    Timeout,

    /// Network, DNS, TLS or protocol failure.
    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    /// The request could not be built.
    #[error("invalid upstream request: {0}")]
    InvalidRequest(String),
}

/// Sends one request to the upstream API.
pub trait Upstream: Clone + Send + Sync + 'static {
    fn send(
        &self,
        request: UpstreamRequest,
    ) -> impl Future<Output = Result<UpstreamResponse, UpstreamError>> + Send;
}
