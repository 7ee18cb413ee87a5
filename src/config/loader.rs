//! Configuration loading from the environment.

use crate::config::env::{EnvSource, ProcessEnv};
use crate::config::schema::AppConfig;
use crate::config::validation::validate;
use crate::config::ConfigError;

/// Load and validate configuration from `source`.
pub fn load(source: &impl EnvSource) -> Result<AppConfig, ConfigError> {
    validate(source).map_err(ConfigError::Validation)
}

/// Read `.env` into the process environment.
///
/// Returns whether a file was found. A missing `.env` file is not an error;
/// variables already set in the environment win over the file.
pub fn load_dotenv() -> Result<bool, ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(true),
        Err(e) if e.not_found() => Ok(false),
        Err(e) => Err(ConfigError::Dotenv(e)),
    }
}

/// Load from the process environment. Call [`load_dotenv`] first.
pub fn load_from_env() -> Result<AppConfig, ConfigError> {
    load(&ProcessEnv)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RequiredKey;
    use std::collections::HashMap;

    #[test]
    fn validation_failure_lists_every_missing_key() {
        let err = load(&HashMap::<&str, &str>::new()).unwrap_err();
        assert_eq!(err.missing_keys(), RequiredKey::ALL.to_vec());
        let message = err.to_string();
        assert!(message.contains("DATABASE_URL is required"));
        assert!(message.contains("JWT_SECRET is required"));
    }
}
