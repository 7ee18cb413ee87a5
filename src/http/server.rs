//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the bootstrap-owned endpoints
//! - Mount the `/api` route groups
//! - Wire up the middleware chain in its fixed order
//! - Install the 404 fallback and panic handler
//! - Serve on a bound listener until shutdown is triggered

use std::net::SocketAddr;

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
};

use crate::error::{not_found, panic_response};
use crate::health::{connectivity_test, health_check};
use crate::http::body::{parse_json, parse_urlencoded};
use crate::http::request::MakeRequestUuid;
use crate::http::AppState;
use crate::observability::{metrics::track_requests, tracing::trace_layer};
use crate::routing::ApiRoutes;
use crate::security::{cors_layer, security_headers, BodyLimit};

/// HTTP server for the API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server around `state` with the given route groups.
    pub fn new(state: AppState, routes: ApiRoutes) -> Self {
        Self {
            router: Self::build_router(state, routes),
        }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layer order, outermost first: request ID, trace span, request ID
    /// propagation, metrics, then the five request stages (security headers,
    /// CORS, cookies, JSON, URL-encoded), then panic capture around handlers.
    pub fn build_router(state: AppState, routes: ApiRoutes) -> Router {
        let limit = BodyLimit::from(&state.config.limits);
        let cors = cors_layer(&state.config.cors);

        Router::new()
            .route("/health", get(health_check))
            .route("/test", get(connectivity_test))
            .merge(routes.mount())
            .fallback(not_found)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(trace_layer())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(middleware::from_fn(track_requests))
                    .layer(middleware::from_fn(security_headers))
                    .layer(cors)
                    .layer(CookieManagerLayer::new())
                    .layer(middleware::from_fn_with_state(limit, parse_json))
                    .layer(middleware::from_fn_with_state(limit, parse_urlencoded))
                    .layer(DefaultBodyLimit::max(limit.bytes()))
                    .layer(CatchPanicLayer::custom(panic_response)),
            )
            .with_state(state)
    }

    /// The fully layered router, for driving with `oneshot` in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain open connections.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body, Bytes},
        http::{header, Request, StatusCode},
        response::Response,
        routing::post,
        Extension, Json,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use tower_cookies::Cookies;

    use crate::config::validation::validate;
    use crate::db::Database;
    use crate::http::ParsedBody;

    async fn state_with(extra: &[(&'static str, &'static str)]) -> AppState {
        let mut env = HashMap::from([
            ("DATABASE_URL", "sqlite::memory:"),
            ("JWT_SECRET", "secret"),
            ("NODE_ENV", "test"),
        ]);
        env.extend(extra.iter().copied());
        let config = validate(&env).unwrap();
        let db = Database::connect(&config.database, &config.environment)
            .await
            .unwrap();
        AppState::new(Arc::new(config), db)
    }

    async fn echo(Extension(body): Extension<ParsedBody>) -> Json<Value> {
        Json(body.value().clone())
    }

    async fn raw(Extension(_parsed): Extension<ParsedBody>, body: Bytes) -> Bytes {
        body
    }

    async fn whoami(cookies: Cookies) -> String {
        cookies
            .get("token")
            .map(|c| c.value().to_string())
            .unwrap_or_default()
    }

    async fn boom() -> &'static str {
        panic!("handler exploded")
    }

    async fn app_with(extra: &[(&'static str, &'static str)]) -> Router {
        let routes = ApiRoutes::new()
            .auth(
                Router::new()
                    .route("/login", post(echo))
                    .route("/raw", post(raw))
                    .route("/me", get(whoami)),
            )
            .statistics(Router::new().route("/stats/boom", get(boom)));
        HttpServer::new(state_with(extra).await, routes).router()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn json_body_reaches_route_group() {
        let response = app_with(&[])
            .await
            .oneshot(post_json("/api/auth/login", r#"{"email":"a@b.c","password":"pw"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"email": "a@b.c", "password": "pw"}));
    }

    #[tokio::test]
    async fn login_body_passes_all_stages_unmodified() {
        let payload = r#"{"email":"sam@example.com","password":"pw12"}"#;
        assert_eq!(payload.len(), 45);
        let payload = format!("{}     ", payload);
        assert_eq!(payload.len(), 50);

        let response = app_with(&[])
            .await
            .oneshot(post_json("/api/auth/raw", &payload))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], payload.as_bytes());
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let response = app_with(&[])
            .await
            .oneshot(post_json("/api/auth/login", "{not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "malformed_body");
    }

    #[tokio::test]
    async fn scalar_json_is_rejected() {
        let response = app_with(&[])
            .await
            .oneshot(post_json("/api/auth/login", "42"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn oversized_body_is_413() {
        let payload = format!(r#"{{"notes":"{}"}}"#, "x".repeat(200));
        let response = app_with(&[("BODY_LIMIT_BYTES", "64")])
            .await
            .oneshot(post_json("/api/auth/login", &payload))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json_body(response).await["error"], "payload_too_large");
    }

    fn post_form(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn oversized_form_body_is_413() {
        let body = format!("notes={}", "x".repeat(200));
        let response = app_with(&[("BODY_LIMIT_BYTES", "64")])
            .await
            .oneshot(post_form("/api/auth/login", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json_body(response).await["error"], "payload_too_large");
    }

    #[tokio::test]
    async fn default_ceiling_is_inclusive() {
        const CEILING: usize = 10 * 1024 * 1024;
        let app = app_with(&[]).await;

        let at_limit = format!(r#"{{"x":"{}"}}"#, "a".repeat(CEILING - 8));
        assert_eq!(at_limit.len(), CEILING);
        let response = app
            .clone()
            .oneshot(post_json("/api/auth/raw", &at_limit))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(bytes.len(), CEILING);

        let over = format!(r#"{{"x":"{}"}}"#, "a".repeat(CEILING - 7));
        let response = app
            .clone()
            .oneshot(post_json("/api/auth/raw", &over))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let form_over = format!("x={}", "a".repeat(CEILING - 1));
        let response = app
            .oneshot(post_form("/api/auth/login", form_over))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn deeply_nested_form_key_is_served() {
        let body = format!("a{}=1", "[b]".repeat(200_000));
        let response = app_with(&[])
            .await
            .oneshot(post_form("/api/auth/login", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let value = json_body(response).await;
        assert!(value["a"]["b"]["b"]["b"]["b"]["b"].is_object());
    }

    #[tokio::test]
    async fn urlencoded_body_is_parsed_extended() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("user[email]=a%40b.c&scopes[]=read&scopes[]=write"))
            .unwrap();

        let response = app_with(&[]).await.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"user": {"email": "a@b.c"}, "scopes": ["read", "write"]})
        );
    }

    #[tokio::test]
    async fn cookies_are_parsed() {
        let request = Request::builder()
            .uri("/api/auth/me")
            .header(header::COOKIE, "token=abc123; theme=dark")
            .body(Body::empty())
            .unwrap();

        let response = app_with(&[]).await.oneshot(request).await.unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"abc123");
    }

    #[tokio::test]
    async fn unmatched_route_is_json_404() {
        let response = app_with(&[])
            .await
            .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key("x-content-type-options"));
        let body = json_body(response).await;
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["message"], "Route /api/nope not found");
    }

    #[tokio::test]
    async fn panicking_handler_is_500() {
        let response = app_with(&[])
            .await
            .oneshot(Request::builder().uri("/api/stats/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["message"], "Internal server error");
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let response = app_with(&[])
            .await
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.headers().contains_key("x-request-id"));

        let response = app_with(&[])
            .await
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "client-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["x-request-id"], "client-42");
    }
}
