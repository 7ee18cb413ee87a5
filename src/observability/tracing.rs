//! HTTP request spans.
//!
//! Every request gets an `http_request` span carrying its method, path and
//! request ID, so log lines from handlers and the database layer can be
//! correlated.

use axum::http::Request;
use tower_http::trace::{HttpMakeClassifier, MakeSpan, TraceLayer};
use tracing::Span;

use crate::http::request::request_id;

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSpan;

impl<B> MakeSpan<B> for RequestSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = request_id(request).unwrap_or("-"),
        )
    }
}

/// Trace layer for the server router. Must sit inside the request ID layer.
pub fn trace_layer() -> TraceLayer<HttpMakeClassifier, RequestSpan> {
    TraceLayer::new_for_http().make_span_with(RequestSpan)
}
