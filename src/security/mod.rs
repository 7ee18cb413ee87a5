//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → headers.rs (security headers on the response)
//!     → cors.rs (origin allow-list, preflight)
//!     → limits.rs (body ceiling used by the parsing stages)
//!     → Pass to routing
//! ```
//!
//! # Design Decisions
//! - Origins are an exact allow-list; no wildcard with credentials
//! - Oversized bodies are rejected before they are parsed

pub mod cors;
pub mod headers;
pub mod limits;

pub use cors::cors_layer;
pub use headers::security_headers;
pub use limits::BodyLimit;
