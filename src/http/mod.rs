//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → gateway.rs (classify → preflight | forward | not found)
//!     → response.rs (relay upstream response, strip hop-by-hop headers)
//!     → Send to client
//! ```

pub mod gateway;
pub mod request;
pub mod response;
pub mod server;

pub use gateway::{Gateway, GatewayBuildError};
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
