//! Configuration validation.
//!
//! # Responsibilities
//! - Presence checks for required variables
//! - Parse numeric, address and URL values
//! - Fill in defaults for everything optional
//!
//! # Design Decisions
//! - Returns all validation issues, not just the first
//! - Pure function: EnvSource → Result<AppConfig, Vec<ValidationIssue>>
//! - `PORT` is lenient: a bad value falls back to the default instead of failing

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::config::env::EnvSource;
use crate::config::schema::{
    AppConfig, CorsConfig, DatabaseConfig, Environment, LifecycleConfig, LimitsConfig,
    ObservabilityConfig, Secret, ServerConfig, DEFAULT_HOST, DEFAULT_LAN_HOST, DEFAULT_PORT,
    EXAMPLE_DATABASE_URL,
};

/// Variables the server refuses to start without.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredKey {
    DatabaseUrl,
    JwtSecret,
}

impl RequiredKey {
    pub const ALL: [RequiredKey; 2] = [RequiredKey::DatabaseUrl, RequiredKey::JwtSecret];

    pub fn env_var(&self) -> &'static str {
        match self {
            RequiredKey::DatabaseUrl => "DATABASE_URL",
            RequiredKey::JwtSecret => "JWT_SECRET",
        }
    }

    /// Remediation hints printed next to the error.
    pub fn hints(&self) -> Vec<String> {
        match self {
            RequiredKey::DatabaseUrl => vec![
                "Please set DATABASE_URL in your .env file".to_string(),
                format!("Example: DATABASE_URL=\"{}\"", EXAMPLE_DATABASE_URL),
            ],
            RequiredKey::JwtSecret => vec![
                "Please set JWT_SECRET in your .env file to a long random string".to_string(),
            ],
        }
    }
}

impl fmt::Display for RequiredKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.env_var())
    }
}

/// A single problem found in the environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("{0} is required")]
    Missing(RequiredKey),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// The required keys among `issues`.
pub fn missing_keys(issues: &[ValidationIssue]) -> Vec<RequiredKey> {
    issues
        .iter()
        .filter_map(|issue| match issue {
            ValidationIssue::Missing(key) => Some(*key),
            ValidationIssue::Invalid { .. } => None,
        })
        .collect()
}

/// Validate the environment and build the typed configuration.
pub fn validate(source: &impl EnvSource) -> Result<AppConfig, Vec<ValidationIssue>> {
    let mut issues = Vec::new();

    let database_url = require(source, RequiredKey::DatabaseUrl, &mut issues);
    if let Some(url) = &database_url {
        if let Err(e) = Url::parse(url) {
            issues.push(ValidationIssue::Invalid {
                key: "DATABASE_URL",
                reason: format!("not a connection URL ({}); example: {}", e, EXAMPLE_DATABASE_URL),
            });
        }
    }
    let jwt_secret = require(source, RequiredKey::JwtSecret, &mut issues);

    let environment = Environment::from_value(source.get("NODE_ENV").as_deref());
    let server = server_config(source, &mut issues);

    let cors = match source.non_empty("CORS_ALLOWED_ORIGINS") {
        Some(raw) => CorsConfig {
            allowed_origins: parse_origins(&raw, &mut issues),
        },
        None => CorsConfig::for_lan_host(&server.lan_host),
    };

    let mut limits = LimitsConfig::default();
    if let Some(bytes) = parse_optional::<usize>(source, "BODY_LIMIT_BYTES", &mut issues) {
        limits.body_limit_bytes = bytes;
    }

    let mut lifecycle = LifecycleConfig::default();
    if let Some(secs) = parse_optional::<u64>(source, "SHUTDOWN_GRACE_SECS", &mut issues) {
        lifecycle.shutdown_grace = Duration::from_secs(secs);
    }

    let observability = ObservabilityConfig {
        metrics_address: parse_optional::<SocketAddr>(source, "METRICS_ADDRESS", &mut issues),
    };

    let max_connections = parse_optional::<u32>(source, "DB_MAX_CONNECTIONS", &mut issues);
    let acquire_timeout = parse_optional::<u64>(source, "DB_ACQUIRE_TIMEOUT_SECS", &mut issues);

    match (database_url, jwt_secret) {
        (Some(url), Some(secret)) if issues.is_empty() => {
            let mut database = DatabaseConfig::new(url);
            if let Some(max) = max_connections {
                database.max_connections = max;
            }
            if let Some(secs) = acquire_timeout {
                database.acquire_timeout = Duration::from_secs(secs);
            }

            Ok(AppConfig {
                server,
                database,
                jwt_secret: Secret::new(secret),
                openai_api_key: source.non_empty("OPENAI_API_KEY").map(Secret::new),
                environment,
                cors,
                limits,
                lifecycle,
                observability,
            })
        }
        _ => Err(issues),
    }
}

fn require(
    source: &impl EnvSource,
    key: RequiredKey,
    issues: &mut Vec<ValidationIssue>,
) -> Option<String> {
    let value = source.non_empty(key.env_var());
    if value.is_none() {
        issues.push(ValidationIssue::Missing(key));
    }
    value
}

fn parse_optional<T>(
    source: &impl EnvSource,
    key: &'static str,
    issues: &mut Vec<ValidationIssue>,
) -> Option<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = source.non_empty(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(e) => {
            issues.push(ValidationIssue::Invalid {
                key,
                reason: format!("'{}': {}", raw, e),
            });
            None
        }
    }
}

fn server_config(source: &impl EnvSource, issues: &mut Vec<ValidationIssue>) -> ServerConfig {
    let mut server = ServerConfig::default();

    if let Some(raw) = source.non_empty("PORT") {
        match raw.trim().parse::<u16>() {
            Ok(port) if port != 0 => server.port = port,
            _ => {
                server.port = DEFAULT_PORT;
                server.rejected_port = Some(raw);
            }
        }
    }

    if let Some(host) = source.non_empty("HOST") {
        match host.trim().parse::<IpAddr>() {
            Ok(_) => server.host = host.trim().to_string(),
            Err(e) => issues.push(ValidationIssue::Invalid {
                key: "HOST",
                reason: format!("'{}': {} (expected an IP such as {})", host, e, DEFAULT_HOST),
            }),
        }
    }

    server.lan_host = source
        .non_empty("LAN_HOST")
        .map(|h| h.trim().to_string())
        .unwrap_or_else(|| DEFAULT_LAN_HOST.to_string());

    server
}

fn parse_origins(raw: &str, issues: &mut Vec<ValidationIssue>) -> Vec<String> {
    let mut origins = Vec::new();
    for origin in raw.split(',').map(str::trim).filter(|o| !o.is_empty()) {
        match Url::parse(origin) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => {
                origins.push(origin.trim_end_matches('/').to_string());
            }
            _ => issues.push(ValidationIssue::Invalid {
                key: "CORS_ALLOWED_ORIGINS",
                reason: format!("'{}' is not an http(s) origin", origin),
            }),
        }
    }
    origins
}
