//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, query)
//!     → router.rs (classification)
//!     → matcher.rs (path prefix test)
//!     → Return: Api { upstream target } or NotFound
//! ```
//!
//! # Design Decisions
//! - Router built at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always yields the same target

pub mod matcher;
pub mod router;

pub use router::{ApiRouter, InvalidTarget, Route};
