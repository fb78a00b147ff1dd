#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use pulseboard_api::auth::password::hash_password;
use pulseboard_api::auth::token::TokenConfig;
use pulseboard_api::config::{BroadcastConfig, GeneratorConfig, RateLimitSettings, ServerConfig};
use pulseboard_api::router::build_app_router;
use pulseboard_api::state::AppState;
use pulseboard_core::roles::Role;
use pulseboard_db::models::user::{CreateUser, User};
use pulseboard_db::repositories::UserRepo;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Build a test `ServerConfig` with safe defaults.
///
/// Rate limits are high enough that ordinary tests never trip them and
/// the generator is off so tables only hold what the test writes.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: TokenConfig {
            secret: "integration-test-secret-with-enough-entropy".to_string(),
            lifetime_hours: 24,
        },
        broadcast: BroadcastConfig {
            interval: Duration::from_secs(5),
            batch: 10,
        },
        generator: GeneratorConfig {
            enabled: false,
            base: Duration::from_millis(4000),
            jitter: Duration::from_millis(1000),
        },
        session_sweep_interval_secs: 900,
        rate_limit: RateLimitSettings {
            window: Duration::from_secs(900),
            api_max: 10_000,
            auth_max: 10_000,
            export_max: 10_000,
            max_tracked_ips: 10_000,
        },
        trusted_proxies: Vec::new(),
    }
}

pub fn test_state(pool: PgPool) -> AppState {
    test_state_with(pool, test_config())
}

pub fn test_state_with(pool: PgPool, config: ServerConfig) -> AppState {
    AppState::new(pool, config)
}

/// Build the full application router with all middleware layers.
pub fn build_test_app(pool: PgPool) -> Router {
    build_app(test_state(pool))
}

pub fn build_app(state: AppState) -> Router {
    let config = state.config.as_ref().clone();
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a user with [`TEST_PASSWORD`] directly through the repository.
pub async fn create_user(pool: &PgPool, email: &str, role: Role) -> User {
    let password_hash = hash_password(TEST_PASSWORD).expect("hashing should succeed");
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            password_hash,
            role,
        },
    )
    .await
    .expect("user creation should succeed")
}

/// Log in through the API and return the bearer token.
pub async fn login(app: Router, email: &str) -> String {
    let body = serde_json::json!({ "email": email, "password": TEST_PASSWORD });
    let response = post_json(app, "/api/auth/login", body).await;
    assert_eq!(response.status(), 200, "login for {email} should succeed");
    let json = body_json(response).await;
    json["token"]
        .as_str()
        .expect("login response must carry a token")
        .to_string()
}

/// Create a user and log them in. Returns the user row and its token.
pub async fn user_with_token(app: Router, pool: &PgPool, email: &str, role: Role) -> (User, String) {
    let user = create_user(pool, email, role).await;
    let token = login(app, email).await;
    (user, token)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

pub async fn body_text(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body should be UTF-8")
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.expect("request should complete")
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    send(app, request).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request should build");
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send(app, json_request(Method::POST, uri, None, body)).await
}

pub async fn post_json_auth(app: Router, uri: &str, token: &str, body: serde_json::Value) -> Response {
    send(app, json_request(Method::POST, uri, Some(token), body)).await
}

pub async fn put_json_auth(app: Router, uri: &str, token: &str, body: serde_json::Value) -> Response {
    send(app, json_request(Method::PUT, uri, Some(token), body)).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request should build");
    send(app, request).await
}

/// POST JSON as if it arrived on a socket from `peer`, optionally carrying an
/// `X-Forwarded-For` header.
pub async fn post_json_from(
    app: Router,
    uri: &str,
    peer: SocketAddr,
    forwarded_for: Option<&str>,
    body: serde_json::Value,
) -> Response {
    let mut request = json_request(Method::POST, uri, None, body);
    request.extensions_mut().insert(ConnectInfo(peer));
    if let Some(value) = forwarded_for {
        request
            .headers_mut()
            .insert("x-forwarded-for", value.parse().expect("header should parse"));
    }
    send(app, request).await
}
