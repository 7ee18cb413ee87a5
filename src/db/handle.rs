//! The shared database handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::BoxFuture;
use sea_orm::{ConnectOptions, DatabaseConnection, DbErr};
use tokio::task::JoinHandle;

use crate::config::{DatabaseConfig, DatabaseKind, Environment};
use crate::lifecycle::shutdown::{Release, ReleaseError};

/// Reference-counted handle to the process's database pool.
///
/// Clones share the same pool. Use [`Database::ptr_eq`] to check that two
/// clones came from the same construction.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

struct DatabaseInner {
    conn: DatabaseConnection,
    kind: DatabaseKind,
    released: AtomicBool,
}

impl Database {
    /// Build a lazily-connecting pool from `config`.
    ///
    /// No connection is opened here; the first query (or [`Database::probe`])
    /// does that.
    pub async fn connect(config: &DatabaseConfig, environment: &Environment) -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new(config.connection_string());
        opt.max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy(true)
            .sqlx_logging(environment.is_development());

        let conn = sea_orm::Database::connect(opt).await?;

        tracing::debug!(
            kind = config.kind().as_str(),
            max_connections = config.max_connections,
            environment = %environment,
            "Database handle created"
        );

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                conn,
                kind: config.kind(),
                released: AtomicBool::new(false),
            }),
        })
    }

    /// The sea-orm connection for issuing queries.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.inner.conn
    }

    pub fn kind(&self) -> DatabaseKind {
        self.inner.kind
    }

    /// Whether `a` and `b` share the same underlying handle.
    pub fn ptr_eq(a: &Database, b: &Database) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// Check connectivity with a round trip to the server.
    pub async fn probe(&self) -> Result<(), DbErr> {
        self.inner.conn.ping().await
    }

    /// Run [`Database::probe`] in the background and log the outcome.
    pub fn spawn_probe(&self) -> JoinHandle<Result<(), DbErr>> {
        let db = self.clone();
        tokio::spawn(async move {
            let result = db.probe().await;
            match &result {
                Ok(()) => tracing::info!("Database connected successfully"),
                Err(e) => {
                    tracing::error!(error = %e, "Database connection failed");
                    tracing::warn!(
                        "Make sure your database is running and the connection string is correct"
                    );
                }
            }
            result
        })
    }

    /// Close the pool. Only the first call does anything.
    ///
    /// Returns `Ok(true)` when this call closed the pool.
    pub async fn disconnect(&self) -> Result<bool, DbErr> {
        if self.inner.released.swap(true, Ordering::SeqCst) {
            return Ok(false);
        }
        self.inner.conn.clone().close().await?;
        tracing::info!("Database disconnected");
        Ok(true)
    }

    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("kind", &self.inner.kind)
            .field("released", &self.is_released())
            .finish()
    }
}

impl Release for Database {
    fn name(&self) -> &str {
        "database"
    }

    fn release(&self) -> BoxFuture<'_, Result<(), ReleaseError>> {
        Box::pin(async move {
            self.disconnect()
                .await
                .map(|_| ())
                .map_err(|e| ReleaseError::new(self.name(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sqlite_config() -> DatabaseConfig {
        DatabaseConfig::new("sqlite::memory:".to_string())
    }

    #[tokio::test]
    async fn probe_succeeds_against_reachable_database() {
        let db = Database::connect(&sqlite_config(), &Environment::Test)
            .await
            .unwrap();
        assert_eq!(db.kind(), DatabaseKind::Sqlite);
        db.probe().await.unwrap();
        assert!(db.spawn_probe().await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn unreachable_database_still_yields_a_handle() {
        let mut config = DatabaseConfig::new("postgres://user:pw@127.0.0.1:1/nutrition".to_string());
        config.acquire_timeout = Duration::from_millis(500);

        let db = Database::connect(&config, &Environment::Test).await.unwrap();
        assert!(db.spawn_probe().await.unwrap().is_err());
        assert!(!db.is_released());
    }

    #[tokio::test]
    async fn disconnect_happens_once() {
        let db = Database::connect(&sqlite_config(), &Environment::Test)
            .await
            .unwrap();
        let clone = db.clone();

        assert!(db.disconnect().await.unwrap());
        assert!(!clone.disconnect().await.unwrap());
        assert!(clone.is_released());
        assert!(db.probe().await.is_err());
    }

    #[tokio::test]
    async fn release_goes_through_disconnect() {
        let db = Database::connect(&sqlite_config(), &Environment::Test)
            .await
            .unwrap();
        db.release().await.unwrap();
        assert!(db.is_released());
    }
}
