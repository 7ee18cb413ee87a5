//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! .env file (optional) + process environment
//!     → loader.rs (dotenvy, then read variables through an EnvSource)
//!     → validation.rs (presence checks, parsing, defaults)
//!     → AppConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - Every optional setting has a default; only DATABASE_URL and JWT_SECRET are required
//! - Validation collects every issue instead of stopping at the first one

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

use thiserror::Error;

pub use env::{EnvSource, ProcessEnv};
pub use loader::{load, load_dotenv, load_from_env};
pub use schema::{
    AiMode, AppConfig, CorsConfig, DatabaseConfig, DatabaseKind, Environment, LifecycleConfig,
    LimitsConfig, ObservabilityConfig, Secret, ServerConfig,
};
pub use validation::{RequiredKey, ValidationIssue};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The `.env` file exists but could not be read or parsed.
    #[error("failed to read .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),

    /// One or more variables are missing or malformed.
    #[error("{}", join_issues(.0))]
    Validation(Vec<ValidationIssue>),
}

impl ConfigError {
    /// Required keys that were absent, in the order they were checked.
    pub fn missing_keys(&self) -> Vec<RequiredKey> {
        match self {
            ConfigError::Validation(issues) => validation::missing_keys(issues),
            ConfigError::Dotenv(_) => Vec::new(),
        }
    }
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    let mut out = String::from("Validation failed: ");
    for (i, issue) in issues.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&issue.to_string());
    }
    out
}
