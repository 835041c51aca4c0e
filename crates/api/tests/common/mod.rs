#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use clientdesk_api::auth::jwt::{generate_access_token, JwtConfig};
use clientdesk_api::config::ServerConfig;
use clientdesk_api::router::build_app_router;
use clientdesk_api::state::AppState;
use clientdesk_core::rate_limit::{FixedWindowRateLimiter, RateLimiter};

/// Build a test `ServerConfig` with a fixed JWT secret and a limit high
/// enough that ordinary tests never trip it.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        rate_limit_max_requests: 10_000,
        rate_limit_window_secs: 60,
        rate_limit_max_keys: 10_000,
        trust_forwarded_for: false,
        jwt: JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// Build the full application router, with every production middleware
/// layer, on the given pool.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let limiter = Arc::new(FixedWindowRateLimiter::new(
        config.rate_limit_max_requests,
        Duration::from_secs(config.rate_limit_window_secs),
    ));
    build_test_app_with_limiter(pool, limiter)
}

pub fn build_test_app_with_limiter(pool: PgPool, limiter: Arc<dyn RateLimiter>) -> Router {
    let config = test_config();
    let state = AppState::new(pool, config.clone(), limiter);
    build_app_router(state, &config)
}

/// A signed token for user 1 carrying `perms`.
pub fn token_with(perms: &[&str]) -> String {
    let perms: Vec<String> = perms.iter().map(|p| p.to_string()).collect();
    generate_access_token(1, "test", &perms, &test_config().jwt).unwrap()
}

pub fn admin_token() -> String {
    token_with(&["*"])
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
