//! Per-request gateway logic.
//!
//! # Request State Machine
//! ```text
//! Received
//!     → Classified { Api | NotFound }
//!     → (Api) Preflight  → 204 answered locally
//!     → (Api) Forward    → one upstream call → relay + allow-origin
//!     → Completed
//! ```
//!
//! No state is revisited and there is no retry loop. The gateway holds only
//! read-only state built once from [`GatewayConfig`], so a single instance is
//! shared across all concurrent requests without locks.

use std::time::Instant;

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderValue, InvalidHeaderValue};
use axum::http::{Method, Request, Response};
use axum::response::IntoResponse;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use url::Url;

use crate::config::GatewayConfig;
use crate::cors::CorsPolicy;
use crate::error::{GatewayError, GatewayResult};
use crate::http::request::request_id;
use crate::http::response::relay;
use crate::observability::metrics;
use crate::routing::{ApiRouter, Route};
use crate::upstream::credentials::CredentialError;
use crate::upstream::{Credentials, HttpUpstream, Upstream, UpstreamError, UpstreamRequest};

/// Error building a [`Gateway`] from configuration.
#[derive(Debug, thiserror::Error)]
pub enum GatewayBuildError {
    #[error("invalid upstream base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("invalid CORS header value: {0}")]
    Cors(#[from] InvalidHeaderValue),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error("cannot create upstream client: {0}")]
    Client(#[from] UpstreamError),
}

/// How a successfully handled request completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Preflight,
    Forwarded,
}

impl Outcome {
    fn as_str(self) -> &'static str {
        match self {
            Outcome::Preflight => "preflight",
            Outcome::Forwarded => "forwarded",
        }
    }
}

/// The proxy gateway: router, CORS policy, credentials and upstream client.
pub struct Gateway<U> {
    router: ApiRouter,
    cors: CorsPolicy,
    credentials: Credentials,
    upstream: U,
    max_body_bytes: usize,
}

impl Gateway<HttpUpstream> {
    /// Build a gateway that talks to the real upstream over HTTP.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayBuildError> {
        let upstream = HttpUpstream::new(&config.timeouts)?;
        Self::new(config, upstream)
    }
}

impl<U: Upstream> Gateway<U> {
    /// Build a gateway around any [`Upstream`] implementation.
    pub fn new(config: &GatewayConfig, upstream: U) -> Result<Self, GatewayBuildError> {
        let creds = &config.credentials;
        Ok(Self {
            router: ApiRouter::from_config(&config.upstream)?,
            cors: CorsPolicy::from_config(&config.cors)?,
            credentials: Credentials::new(
                &creds.client_id_header,
                &creds.client_id,
                &creds.client_secret_header,
                &creds.client_secret,
            )?,
            upstream,
            max_body_bytes: config.listener.max_body_bytes,
        })
    }

    /// Handle one inbound request. Never fails: every error becomes a response.
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        let start = Instant::now();
        let request_id = request_id(&request);
        let method = request.method().clone();
        let path = request.uri().path().to_string();

        match self.dispatch(request).await {
            Ok((outcome, response)) => {
                metrics::record_request(outcome.as_str(), response.status().as_u16(), start);
                response
            }
            Err(err) => {
                match &err {
                    GatewayError::NotFound => {
                        tracing::debug!(request_id = %request_id, method = %method, path = %path, "No route matched");
                    }
                    GatewayError::Upstream(e) => {
                        tracing::error!(request_id = %request_id, method = %method, path = %path, error = %e, "Upstream error");
                    }
                    other => {
                        tracing::warn!(request_id = %request_id, method = %method, path = %path, error = %other, "Request rejected");
                    }
                }
                metrics::record_request(err.outcome(), err.status().as_u16(), start);
                err.into_response()
            }
        }
    }

    async fn dispatch(&self, request: Request<Body>) -> GatewayResult<(Outcome, Response<Body>)> {
        let target = match self.router.classify(request.uri())? {
            Route::NotFound => return Err(GatewayError::NotFound),
            Route::Api { target } => target,
        };

        if request.method() == Method::OPTIONS {
            self.note_rejected_origin(request.headers());
            return Ok((Outcome::Preflight, self.cors.preflight(request.headers())));
        }

        self.forward(request, target).await.map(|r| (Outcome::Forwarded, r))
    }

    /// Forward to the upstream with injected credentials and relay the result.
    async fn forward(&self, request: Request<Body>, target: Url) -> GatewayResult<Response<Body>> {
        let (parts, body) = request.into_parts();

        let body = if parts.method == Method::GET {
            None
        } else {
            let collected = Limited::new(body, self.max_body_bytes)
                .collect()
                .await
                .map_err(|e| {
                    if e.downcast_ref::<LengthLimitError>().is_some() {
                        GatewayError::PayloadTooLarge(self.max_body_bytes)
                    } else {
                        GatewayError::BodyRead(e.to_string())
                    }
                })?;
            Some(collected.to_bytes())
        };

        let outbound = self.outbound_request(parts.method.clone(), target, body);
        tracing::debug!(
            method = %outbound.method,
            target = %outbound.url,
            has_body = outbound.body.is_some(),
            "Forwarding request"
        );

        let upstream_response = self.upstream.send(outbound).await?;
        let status = upstream_response.status;
        if status.is_success() {
            tracing::info!(method = %parts.method, path = %parts.uri.path(), status = %status, "Upstream responded");
        } else {
            tracing::warn!(method = %parts.method, path = %parts.uri.path(), status = %status, "Upstream returned error status");
        }

        let mut response = relay(upstream_response, &self.credentials);
        if !self.cors.apply_allow_origin(&parts.headers, response.headers_mut()) {
            self.note_rejected_origin(&parts.headers);
        }
        Ok(response)
    }

    /// Outbound request: content type and credentials only; inbound headers are not forwarded.
    fn outbound_request(&self, method: Method, url: Url, body: Option<axum::body::Bytes>) -> UpstreamRequest {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.credentials.apply(&mut headers);
        UpstreamRequest {
            method,
            url,
            headers,
            body,
        }
    }

    fn note_rejected_origin(&self, headers: &HeaderMap) {
        if let Some(origin) = headers.get(header::ORIGIN) {
            if self.cors.origins().allowed_origin(headers).is_none() {
                tracing::debug!(origin = ?origin, "Origin not allowed; omitting allow-origin");
                metrics::record_origin_rejected();
            }
        }
    }
}
