//! `GET /test`, a connectivity check for devices on the LAN.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Request},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::health::timestamp;
use crate::http::AppState;

pub const CONNECTIVITY_MESSAGE: &str = "Nutrition Tracker Server is running!";

/// Echo of what the server saw from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityReport {
    pub message: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(rename = "userAgent", skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    pub openai_enabled: bool,
}

/// Header value decoded byte for byte as latin-1, so obs-text survives.
fn header_text(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .map(|v| v.as_bytes().iter().map(|&b| b as char).collect())
}

pub async fn connectivity_test(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Json<ConnectivityReport> {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());

    tracing::info!(ip = ip.as_deref().unwrap_or("unknown"), "Test endpoint hit");

    let headers = request.headers();
    Json(ConnectivityReport {
        message: CONNECTIVITY_MESSAGE.to_string(),
        timestamp: timestamp(),
        ip,
        user_agent: header_text(headers, header::USER_AGENT),
        origin: header_text(headers, header::ORIGIN),
        openai_enabled: state.openai_enabled(),
    })
}
