//! Request body limits.
//!
//! # Responsibilities
//! - Carry the configured body ceiling into the parsing stages
//! - Reject oversized bodies from `Content-Length` before reading them
//! - Stop reading a streamed body once it passes the ceiling
//!
//! # Design Decisions
//! - One ceiling for JSON and URL-encoded bodies
//! - Return 413 Payload Too Large, never a truncated body

use std::error::Error as StdError;

use axum::{
    body::{Body, Bytes},
    http::{header::CONTENT_LENGTH, HeaderMap},
};
use http_body_util::LengthLimitError;

use crate::config::LimitsConfig;
use crate::error::AppError;

/// Maximum accepted body size in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyLimit(pub usize);

impl BodyLimit {
    pub fn bytes(&self) -> usize {
        self.0
    }
}

impl From<&LimitsConfig> for BodyLimit {
    fn from(config: &LimitsConfig) -> Self {
        Self(config.body_limit_bytes)
    }
}

/// Declared `Content-Length`, if present and well formed.
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Read `body` into memory, failing with 413 once it exceeds `limit`.
pub async fn buffer_limited(
    headers: &HeaderMap,
    body: Body,
    limit: BodyLimit,
) -> Result<Bytes, AppError> {
    if declared_length(headers).is_some_and(|len| len > limit.0 as u64) {
        return Err(AppError::PayloadTooLarge { limit: limit.0 });
    }

    axum::body::to_bytes(body, limit.0).await.map_err(|e| {
        if exceeded_limit(&e) {
            AppError::PayloadTooLarge { limit: limit.0 }
        } else {
            AppError::BadRequest(format!("Failed to read request body: {}", e))
        }
    })
}

fn exceeded_limit(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}
