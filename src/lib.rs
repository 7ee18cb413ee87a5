//! Nutrition Tracker API server library.

pub mod config;
pub mod db;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::AppConfig;
pub use db::{Database, DatabaseProvider};
pub use http::{AppState, HttpServer};
pub use lifecycle::{Bootstrap, Shutdown};
pub use routing::ApiRoutes;
