//! Cross-origin (CORS) handling.
//!
//! # Data Flow
//! ```text
//! Origin header
//!     → origin.rs (exact-match test against the Allowed Origin Set)
//!     → preflight.rs (204 preflight, or allow-origin on relayed responses)
//! ```
//!
//! # Design Decisions
//! - Origin never gates forwarding; the browser enforces rejection
//! - No wildcard `*` is ever emitted

pub mod origin;
pub mod preflight;

pub use origin::AllowedOrigins;
pub use preflight::CorsPolicy;
