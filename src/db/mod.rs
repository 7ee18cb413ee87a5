//! Database handle subsystem.
//!
//! # Data Flow
//! ```text
//! DatabaseConfig (validated URL, pool sizing)
//!     → provider.rs (constructs the handle on first access, reuses it afterwards)
//!     → handle.rs (sea-orm connection, advisory probe, release)
//!     → cloned into AppState for every route group
//!     → released once by the shutdown coordinator
//! ```
//!
//! # Design Decisions
//! - One pool per process; the provider is the only place that constructs it
//! - Connections are opened lazily so an unreachable database never blocks startup
//! - The connectivity probe only logs; it never fails the process

pub mod handle;
pub mod provider;

pub use handle::Database;
pub use provider::DatabaseProvider;

use crate::config::Environment;

/// Filter directives for ORM and driver logs.
///
/// Development surfaces warnings and errors; every other environment only errors.
pub fn orm_log_directives(environment: &Environment) -> &'static str {
    if environment.is_development() {
        "sea_orm=warn,sqlx=warn"
    } else {
        "sea_orm=error,sqlx=error"
    }
}
