//! Response relay.
//!
//! # Responsibilities
//! - Turn a buffered upstream response into the client response
//! - Keep status, body and end-to-end headers unchanged
//! - Strip hop-by-hop headers and anything named like a credential header
//!
//! # Design Decisions
//! - Body is re-framed locally, so upstream framing headers do not apply
//! - CORS decoration happens after relay, in the gateway

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, Response};

use crate::upstream::{Credentials, UpstreamResponse};

/// Connection-scoped headers that must not be relayed.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Build the client response from an upstream response.
pub fn relay(upstream: UpstreamResponse, credentials: &Credentials) -> Response<Body> {
    let mut response = Response::new(Body::from(upstream.body));
    *response.status_mut() = upstream.status;
    *response.headers_mut() = end_to_end_headers(upstream.headers, credentials);
    response
}

fn end_to_end_headers(mut headers: HeaderMap, credentials: &Credentials) -> HeaderMap {
    // Headers listed in `Connection` are hop-by-hop too.
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in HOP_BY_HOP.iter().chain(listed.iter()) {
        headers.remove(name);
    }
    for name in credentials.header_names() {
        headers.remove(name);
    }
    headers
}
