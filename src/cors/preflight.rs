//! Preflight responses and allow-origin decoration of relayed responses.
//!
//! # Responsibilities
//! - Answer `OPTIONS` on the proxied namespace locally with 204
//! - Add `Access-Control-Allow-Origin` to relayed responses for allowed origins
//!
//! # Design Decisions
//! - A rejected origin gets no allow-origin header at all (never an empty one)
//! - Preflight never touches the upstream and allocates nothing per request
//!   beyond the response itself

use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderValue, InvalidHeaderValue};
use axum::http::{Response, StatusCode};

use crate::config::CorsConfig;
use crate::cors::origin::AllowedOrigins;

/// Immutable CORS policy built once at startup.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origins: AllowedOrigins,
    allow_methods: HeaderValue,
    allow_headers: HeaderValue,
    max_age: Option<HeaderValue>,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            origins: AllowedOrigins::new(config.allowed_origins.iter().cloned()),
            allow_methods: HeaderValue::from_str(&config.allow_methods)?,
            allow_headers: HeaderValue::from_str(&config.allow_headers)?,
            max_age: config.max_age_secs.map(HeaderValue::from),
        })
    }

    pub fn origins(&self) -> &AllowedOrigins {
        &self.origins
    }

    /// Build the local 204 response for a preflight request.
    pub fn preflight(&self, request_headers: &HeaderMap) -> Response<Body> {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;

        let headers = response.headers_mut();
        if let Some(origin) = self.origins.allowed_origin(request_headers) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
            headers.append(header::VARY, HeaderValue::from_static("Origin"));
        }
        headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, self.allow_methods.clone());
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
        if let Some(max_age) = &self.max_age {
            headers.insert(header::ACCESS_CONTROL_MAX_AGE, max_age.clone());
        }

        response
    }

    /// Set `Access-Control-Allow-Origin` on a relayed response if the inbound
    /// origin is allowed. Returns whether the header was set.
    ///
    /// When the origin is not allowed the response headers are left untouched.
    pub fn apply_allow_origin(&self, request_headers: &HeaderMap, response_headers: &mut HeaderMap) -> bool {
        match self.origins.allowed_origin(request_headers) {
            Some(origin) => {
                response_headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
                let varies_on_origin = response_headers
                    .get_all(header::VARY)
                    .iter()
                    .filter_map(|v| v.to_str().ok())
                    .flat_map(|v| v.split(','))
                    .any(|v| v.trim().eq_ignore_ascii_case("origin") || v.trim() == "*");
                if !varies_on_origin {
                    response_headers.append(header::VARY, HeaderValue::from_static("Origin"));
                }
                true
            }
            None => false,
        }
    }
}
