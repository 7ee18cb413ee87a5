//! `GET /health`.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::health::timestamp;
use crate::http::AppState;

/// Liveness document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    /// Database family from the configured URL, not a connectivity result.
    pub database: String,
    pub environment: String,
    pub openai_enabled: bool,
}

/// Liveness only; never touches the database.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        timestamp: timestamp(),
        database: state.config.database.kind().as_str().to_string(),
        environment: state.config.environment_name().to_string(),
        openai_enabled: state.openai_enabled(),
    })
}
