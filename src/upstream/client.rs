//! HTTP client for the upstream API.
//!
//! # Responsibilities
//! - Issue exactly one outbound request per call
//! - Enforce connect and total deadlines
//! - Buffer the complete response body
//!
//! # Design Decisions
//! - reqwest handles TLS, DNS and connection pooling
//! - No redirects are followed; a 3xx is relayed like any other status
//! - Environment proxy settings are ignored; the upstream is dialed directly
//! - Dropping the returned future aborts the outbound call

use std::time::Duration;

use crate::config::TimeoutConfig;
use crate::upstream::{Upstream, UpstreamError, UpstreamRequest, UpstreamResponse};

/// reqwest-backed [`Upstream`].
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, UpstreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .timeout(Duration::from_secs(timeouts.upstream_secs))
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()
            .map_err(|e| UpstreamError::InvalidRequest(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Upstream for HttpUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(classify)?;

        Ok(UpstreamResponse { status, headers, body })
    }
}

fn classify(err: reqwest::Error) -> UpstreamError {
    if err.is_timeout() {
        UpstreamError::Timeout
    } else if err.is_builder() {
        UpstreamError::InvalidRequest(err.to_string())
    } else {
        UpstreamError::Unreachable(err.to_string())
    }
}
