//! Sources of environment variables.
//!
//! Validation reads through [`EnvSource`] so tests can feed a plain map
//! instead of mutating the process environment.

use std::collections::HashMap;

/// Read access to a set of environment variables.
pub trait EnvSource {
    /// Raw value of `key`, if set.
    fn get(&self, key: &str) -> Option<String>;

    /// Value of `key` when set to something other than blank.
    ///
    /// An empty variable counts as unset.
    fn non_empty(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }
}

impl EnvSource for HashMap<&str, &str> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).map(|v| v.to_string())
    }
}
