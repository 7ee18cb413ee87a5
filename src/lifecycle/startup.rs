//! Startup orchestration.
//!
//! # Responsibilities
//! - Report configuration problems before anything else starts
//! - Construct the database handle and register it for shutdown
//! - Bind the listener, print the banner, serve
//! - On a termination signal: drain, release, report how the process ended
//!
//! # Design Decisions
//! - Fail fast: configuration and bind errors are fatal
//! - The database probe is advisory and never blocks startup
//! - Listeners start last (traffic only when ready)

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sea_orm::DbErr;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::{AiMode, AppConfig, ConfigError, ValidationIssue};
use crate::db::{Database, DatabaseProvider};
use crate::http::{AppState, HttpServer};
use crate::lifecycle::shutdown::{ReleaseReport, Shutdown, ShutdownCoordinator};
use crate::lifecycle::signals::{TerminationSignal, TerminationSignals};
use crate::net::{self, ListenerError};
use crate::observability::metrics::init_metrics;
use crate::routing::ApiRoutes;

/// Fatal startup failures. Any of them means exit status 1.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to create database handle: {0}")]
    Database(#[from] DbErr),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("server error: {0}")]
    Io(#[from] io::Error),
}

/// How a served process came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// A termination signal arrived and shutdown completed.
    Signal(TerminationSignal),
    /// The server stopped on its own.
    ServerStopped,
}

/// Log every configuration issue with its remediation hints.
pub fn report_config_error(error: &ConfigError) {
    match error {
        ConfigError::Validation(issues) => {
            for issue in issues {
                tracing::error!("{}", issue);
                if let ValidationIssue::Missing(key) = issue {
                    for hint in key.hints() {
                        tracing::error!("{}", hint);
                    }
                }
            }
        }
        ConfigError::Dotenv(_) => tracing::error!("{}", error),
    }
}

/// Owns everything the server needs between configuration and exit.
pub struct Bootstrap {
    config: Arc<AppConfig>,
    provider: DatabaseProvider,
    coordinator: ShutdownCoordinator,
    routes: ApiRoutes,
    registered: AtomicBool,
}

impl Bootstrap {
    pub fn new(config: AppConfig, routes: ApiRoutes) -> Self {
        let provider = DatabaseProvider::new(config.database.clone(), config.environment.clone());
        Self {
            config: Arc::new(config),
            provider,
            coordinator: ShutdownCoordinator::new(),
            routes,
            registered: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn coordinator(&self) -> &ShutdownCoordinator {
        &self.coordinator
    }

    pub fn provider(&self) -> &DatabaseProvider {
        &self.provider
    }

    /// The shared database handle, registered for release on first access.
    pub async fn database(&self) -> Result<Database, DbErr> {
        let db = self.provider.handle().await?;
        if !self.registered.swap(true, Ordering::SeqCst) {
            self.coordinator.register(Arc::new(db.clone()));
        }
        Ok(db)
    }

    /// Start everything and serve until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<Exit, StartupError> {
        self.log_startup_mode();

        if let Some(addr) = self.config.observability.metrics_address {
            if let Err(e) = init_metrics(addr) {
                tracing::warn!(address = %addr, error = %e, "Metrics exporter disabled");
            }
        }

        self.database().await?;

        let signals = match TerminationSignals::register() {
            Ok(signals) => signals,
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handlers");
                self.coordinator.release_all().await;
                return Err(e.into());
            }
        };

        let listener = match net::bind(&self.config.bind_address()).await {
            Ok(listener) => listener,
            Err(e) => {
                tracing::error!(error = %e, "Failed to start server");
                tracing::error!("{}", e.hint());
                self.coordinator.release_all().await;
                return Err(e.into());
            }
        };

        let port = listener.local_addr()?.port();
        print_banner(&self.config, port);

        self.serve(listener, signals.recv()).await
    }

    /// Serve on `listener` until `signal` resolves or the server stops.
    ///
    /// Either way every registered resource is released before returning.
    pub async fn serve<F>(self, listener: TcpListener, signal: F) -> Result<Exit, StartupError>
    where
        F: Future<Output = io::Result<TerminationSignal>>,
    {
        let db = self.database().await?;
        let Bootstrap {
            config,
            coordinator,
            routes,
            ..
        } = self;

        let grace = config.lifecycle.shutdown_grace;
        let server = HttpServer::new(AppState::new(config, db), routes);
        let shutdown = Shutdown::new();
        let mut task = tokio::spawn(server.run(listener, shutdown.subscribe()));

        tokio::select! {
            received = signal => {
                shutdown.trigger();
                let signal = match received {
                    Ok(signal) => signal,
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to listen for termination signals");
                        drain(task, grace).await;
                        release(&coordinator).await;
                        return Err(e.into());
                    }
                };

                tracing::info!(signal = %signal, "Shutting down gracefully...");
                drain(task, grace).await;
                release(&coordinator).await;
                Ok(Exit::Signal(signal))
            }
            finished = &mut task => {
                release(&coordinator).await;
                match finished {
                    Ok(Ok(())) => Ok(Exit::ServerStopped),
                    Ok(Err(e)) => Err(StartupError::Io(e)),
                    Err(e) => Err(StartupError::Io(io::Error::other(e))),
                }
            }
        }
    }

    fn log_startup_mode(&self) {
        if let Some(raw) = &self.config.server.rejected_port {
            tracing::warn!(value = %raw, port = self.config.server.port, "Ignoring invalid PORT");
        }

        match self.config.ai_mode() {
            AiMode::Live => tracing::info!("OpenAI API key configured, AI analysis enabled"),
            AiMode::Mock => {
                tracing::warn!("OPENAI_API_KEY not set, AI features will use mock data");
                tracing::warn!("Set OPENAI_API_KEY in your .env file to enable real AI analysis");
            }
        }
    }
}

/// Wait up to `grace` for the server to finish draining, then abort it.
async fn drain(mut task: JoinHandle<io::Result<()>>, grace: Duration) {
    match tokio::time::timeout(grace, &mut task).await {
        Ok(Ok(Ok(()))) => {}
        Ok(Ok(Err(e))) => tracing::warn!(error = %e, "Server exited with an error while draining"),
        Ok(Err(e)) => tracing::error!(error = %e, "Server task failed"),
        Err(_) => {
            tracing::warn!(
                grace_secs = grace.as_secs(),
                "Drain window elapsed, closing remaining connections"
            );
            task.abort();
        }
    }
}

async fn release(coordinator: &ShutdownCoordinator) -> ReleaseReport {
    let report = coordinator.release_all().await;
    if report.is_clean() {
        tracing::info!(released = report.released.len(), "Shutdown complete");
    } else {
        tracing::warn!(failed = ?report.failed, "Shutdown finished with release failures");
    }
    report
}

fn print_banner(config: &AppConfig, port: u16) {
    let lan = &config.server.lan_host;
    tracing::info!(port, "Server running on port {}", port);
    tracing::info!("Database: {}", config.database.kind().as_str());
    tracing::info!("Environment: {}", config.environment_name());
    tracing::info!("Access from phone: http://{}:{}", lan, port);
    tracing::info!("Cookie-based authentication enabled");
    tracing::info!("Test endpoint: http://{}:{}/test", lan, port);
    tracing::info!("Health check: http://{}:{}/health", lan, port);
    if config.ai_mode() == AiMode::Mock {
        tracing::info!("AI analysis is running in mock mode");
    }
}
