//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Gateway and middleware produce:
//!     → logging.rs (structured log events, request-id spans)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Everything here is operator-facing; nothing reaches the HTTP caller
//! - Request ID flows through the per-request span

pub mod logging;
pub mod metrics;
