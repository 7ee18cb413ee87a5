//! Bootstrap-owned status endpoints.
//!
//! # Data Flow
//! ```text
//! GET /health → liveness.rs (status, environment, database kind, AI flag)
//! GET /test   → connectivity.rs (echo of caller ip, user agent, origin)
//! ```
//!
//! # Design Decisions
//! - Neither endpoint queries the database; both answer as long as the process serves
//! - Timestamps are UTC ISO-8601 with millisecond precision

pub mod connectivity;
pub mod liveness;

pub use connectivity::{connectivity_test, ConnectivityReport};
pub use liveness::{health_check, HealthStatus};

use chrono::{SecondsFormat, Utc};

/// Current time as `2024-01-01T12:00:00.000Z`.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
