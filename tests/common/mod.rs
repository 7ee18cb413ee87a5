//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use nutrition_server::config::{validation::validate, AppConfig};
use nutrition_server::db::Database;
use nutrition_server::http::{AppState, HttpServer};
use nutrition_server::lifecycle::Shutdown;
use nutrition_server::routing::ApiRoutes;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Validated config over an in-memory database, with `extra` variables on top.
pub fn test_config(extra: &[(&'static str, &'static str)]) -> AppConfig {
    let mut env = HashMap::from([
        ("DATABASE_URL", "sqlite::memory:"),
        ("JWT_SECRET", "integration-secret"),
        ("NODE_ENV", "test"),
    ]);
    env.extend(extra.iter().copied());
    validate(&env).expect("test environment should validate")
}

/// A server bound to an ephemeral port on loopback.
pub struct TestServer {
    pub addr: SocketAddr,
    pub db: Database,
    shutdown: Shutdown,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Trigger graceful shutdown and wait for the server task.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = self.handle.await;
    }
}

/// Start a server with `routes` mounted and `extra` environment overrides.
pub async fn spawn_server(routes: ApiRoutes, extra: &[(&'static str, &'static str)]) -> TestServer {
    let config = test_config(extra);
    let db = Database::connect(&config.database, &config.environment)
        .await
        .expect("lazy connect never touches the network");

    let state = AppState::new(Arc::new(config), db.clone());
    let server = HttpServer::new(state, routes);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestServer {
        addr,
        db,
        shutdown,
        handle,
    }
}
