//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Pick default filter directives per environment
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the defaults
//! - JSON output when `LOG_FORMAT=json`, human-readable otherwise

use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, util::TryInitError, EnvFilter,
};

use crate::config::Environment;
use crate::db::orm_log_directives;

/// Filter used when `RUST_LOG` is unset.
pub fn default_directives(environment: &Environment) -> String {
    let level = if environment.is_development() { "debug" } else { "info" };
    format!(
        "nutrition_server={level},tower_http={level},{}",
        orm_log_directives(environment)
    )
}

fn json_requested() -> bool {
    std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

/// Install the global subscriber. Fails if one is already set.
pub fn init(environment: &Environment) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(environment)));
    let json = json_requested();

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json().with_target(false)))
        .with((!json).then(fmt::layer))
        .try_init()
}
