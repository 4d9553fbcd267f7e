//! Edge proxy gateway library.
//!
//! Sits between a browser client and a private upstream API: validates the
//! browser `Origin`, answers CORS preflights locally, injects service
//! credentials into forwarded requests and relays upstream responses.

pub mod config;
pub mod cors;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod upstream;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::{Gateway, HttpServer};
pub use lifecycle::Shutdown;
