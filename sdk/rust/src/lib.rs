//! Client for the nutrition tracker server's bootstrap endpoints.

pub mod client;

pub use client::{HealthResponse, ServerClient, TestResponse};
