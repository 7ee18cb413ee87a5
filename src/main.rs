//! Nutrition Tracker API server.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────────┐
//!                    │                    API SERVER                         │
//!                    │                                                       │
//!   Mobile client    │  ┌────────┐   ┌──────────┐   ┌──────┐   ┌─────────┐  │
//!   ─────────────────┼─▶│  net   │──▶│ security │──▶│ http │──▶│ routing │  │
//!                    │  │listener│   │headers + │   │body  │   │ /api/*  │  │
//!                    │  └────────┘   │  CORS    │   │parse │   │ groups  │  │
//!                    │               └──────────┘   └──────┘   └────┬────┘  │
//!                    │                                              │       │
//!                    │                                              ▼       │
//!                    │                                        ┌──────────┐  │
//!                    │                                        │    db    │──┼──▶ PostgreSQL
//!                    │                                        │  handle  │  │
//!                    │                                        └──────────┘  │
//!                    │  ┌─────────────────────────────────────────────────┐ │
//!                    │  │ config · lifecycle · observability · health     │ │
//!                    │  └─────────────────────────────────────────────────┘ │
//!                    └──────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use nutrition_server::config::{self, Environment};
use nutrition_server::lifecycle::startup::{report_config_error, Bootstrap};
use nutrition_server::observability::logging;
use nutrition_server::routing::ApiRoutes;

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = config::load_dotenv();

    let environment = Environment::from_value(std::env::var("NODE_ENV").ok().as_deref());
    if let Err(e) = logging::init(&environment) {
        eprintln!("Failed to initialise logging: {}", e);
    }

    tracing::info!("Starting Nutrition Tracker Server...");
    match dotenv {
        Ok(true) => tracing::debug!("Loaded .env file"),
        Ok(false) => tracing::debug!("No .env file found, using process environment"),
        Err(e) => {
            report_config_error(&e);
            return ExitCode::FAILURE;
        }
    }

    let config = match config::load_from_env() {
        Ok(config) => config,
        Err(e) => {
            report_config_error(&e);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        port = config.server.port,
        environment = %config.environment,
        "Configuration loaded"
    );

    match Bootstrap::new(config, ApiRoutes::default()).run().await {
        Ok(exit) => {
            tracing::info!(?exit, "Server exited");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Server failed");
            ExitCode::FAILURE
        }
    }
}
