//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Database;

/// Shared resources handed to every handler and route group.
///
/// Cloning is cheap: the config sits behind an `Arc` and the database handle
/// is reference-counted, so every clone talks to the same pool.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Database,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>, db: Database) -> Self {
        Self { config, db }
    }

    pub fn openai_enabled(&self) -> bool {
        self.config.openai_enabled()
    }
}
