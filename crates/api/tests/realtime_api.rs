//! End-to-end real-time tests over a live socket.
//!
//! Each test serves the full router on an ephemeral port and drives it with
//! `tokio-tungstenite` clients. HTTP calls go through the same router (and
//! therefore the same hub) via `oneshot`.

mod common;

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::StatusCode;
use futures::{SinkExt, StreamExt};
use pulseboard_api::state::AppState;
use pulseboard_core::roles::Role;
use serde_json::{json, Value};
use sqlx::PgPool;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const FRAME_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Serve the app on 127.0.0.1:0 and return its address.
async fn serve(state: AppState) -> SocketAddr {
    let app = common::build_app(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });
    addr
}

/// Connect and consume the `connection` ack.
async fn connect(addr: SocketAddr) -> Client {
    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    let ack = next_frame(&mut ws).await;
    assert_eq!(ack["type"], "connection");
    assert!(ack["connection_id"].is_string());
    ws
}

async fn send(ws: &mut Client, value: Value) {
    ws.send(Message::Text(value.to_string())).await.unwrap();
}

/// Next JSON text frame, skipping transport pings.
async fn next_frame(ws: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(FRAME_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .expect("socket error");
        match msg {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Skip frames until one of `kind` arrives.
async fn next_of_type(ws: &mut Client, kind: &str) -> Value {
    loop {
        let frame = next_frame(ws).await;
        if frame["type"] == kind {
            return frame;
        }
    }
}

/// Assert no frame of `kind` arrives within a short quiet period.
async fn assert_silent_for(ws: &mut Client, kind: &str) {
    let deadline = tokio::time::Instant::now() + Duration::from_millis(300);
    loop {
        match tokio::time::timeout_at(deadline, ws.next()).await {
            Err(_) => return,
            Ok(Some(Ok(Message::Text(text)))) => {
                let frame: Value = serde_json::from_str(&text).unwrap();
                assert_ne!(frame["type"], kind, "unexpected {kind}: {frame}");
            }
            Ok(Some(Ok(_))) => continue,
            Ok(_) => return,
        }
    }
}

async fn authenticate(ws: &mut Client, token: &str) -> Value {
    send(ws, json!({ "type": "auth", "token": token })).await;
    next_of_type(ws, "auth_success").await
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

/// Two authenticated clients each receive exactly one `metric_created`
/// carrying the posted row.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_metric_created_reaches_every_authenticated_client(pool: PgPool) {
    let state = common::test_state(pool.clone());
    let app = common::build_app(state.clone());
    let (_, token_a) = common::user_with_token(app.clone(), &pool, "a@example.com", Role::User).await;
    let (_, token_b) = common::user_with_token(app.clone(), &pool, "b@example.com", Role::Admin).await;
    let addr = serve(state).await;

    let mut ws_a = connect(addr).await;
    let mut ws_b = connect(addr).await;
    let ok_a = authenticate(&mut ws_a, &token_a).await;
    let ok_b = authenticate(&mut ws_b, &token_b).await;
    assert_eq!(ok_a["user"]["email"], "a@example.com");
    assert_eq!(ok_b["user"]["role"], "admin");

    let body = json!({ "type": "cpu_utilization", "value": 42, "metadata": { "cores": 16 } });
    let response = common::post_json_auth(app, "/api/metrics", &token_a, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = common::body_json(response).await;

    for ws in [&mut ws_a, &mut ws_b] {
        let frame = next_of_type(ws, "metric_created").await;
        assert_eq!(frame["data"], created["data"]);
        assert_eq!(frame["data"]["type"], "cpu_utilization");
        assert_eq!(frame["data"]["value"], 42);
        assert!(frame["timestamp"].is_string());
        assert_silent_for(ws, "metric_created").await;
    }
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_unauthenticated_client_gets_no_broadcasts(pool: PgPool) {
    let state = common::test_state(pool.clone());
    let app = common::build_app(state.clone());
    let (_, token) = common::user_with_token(app.clone(), &pool, "u@example.com", Role::User).await;
    let addr = serve(state.clone()).await;

    let mut anon = connect(addr).await;

    let body = json!({ "type": "memory_usage", "value": 50 });
    let response = common::post_json_auth(app, "/api/metrics", &token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    assert_silent_for(&mut anon, "metric_created").await;
    assert_eq!(state.hub.authenticated_count().await, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_bad_input_keeps_connection_open(pool: PgPool) {
    let state = common::test_state(pool.clone());
    let addr = serve(state).await;
    let mut ws = connect(addr).await;

    ws.send(Message::Text("{not json".into())).await.unwrap();
    let frame = next_of_type(&mut ws, "error").await;
    assert_eq!(frame["message"], "Invalid message format");

    send(&mut ws, json!({ "type": "teleport" })).await;
    let frame = next_of_type(&mut ws, "error").await;
    assert_eq!(frame["message"], "Unknown message type");

    ws.send(Message::Binary(vec![1, 2, 3])).await.unwrap();
    let frame = next_of_type(&mut ws, "error").await;
    assert_eq!(frame["message"], "Binary messages are not supported");

    send(&mut ws, json!({ "type": "ping" })).await;
    let frame = next_of_type(&mut ws, "pong").await;
    assert!(frame["timestamp"].is_string());
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_auth_and_subscribe_errors(pool: PgPool) {
    let state = common::test_state(pool.clone());
    let app = common::build_app(state.clone());
    let (_, token) = common::user_with_token(app, &pool, "s@example.com", Role::User).await;
    let addr = serve(state).await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({ "type": "subscribe" })).await;
    let frame = next_of_type(&mut ws, "error").await;
    assert_eq!(frame["message"], "Authentication required");

    send(&mut ws, json!({ "type": "auth" })).await;
    let frame = next_of_type(&mut ws, "error").await;
    assert_eq!(frame["message"], "Token required");

    send(&mut ws, json!({ "type": "auth", "token": "garbage" })).await;
    let frame = next_of_type(&mut ws, "error").await;
    assert_eq!(frame["message"], "Invalid token");

    authenticate(&mut ws, &token).await;
    send(&mut ws, json!({ "type": "subscribe" })).await;
    let frame = next_of_type(&mut ws, "subscribed").await;
    assert_eq!(frame["channels"], json!(["metrics", "alerts", "audit"]));
}

/// A token revoked by logout cannot authenticate a socket.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_logged_out_token_rejected_on_socket(pool: PgPool) {
    let state = common::test_state(pool.clone());
    let app = common::build_app(state.clone());
    let (_, token) = common::user_with_token(app.clone(), &pool, "out@example.com", Role::User).await;
    let response = common::post_json_auth(app, "/api/auth/logout", &token, json!({})).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let addr = serve(state).await;
    let mut ws = connect(addr).await;
    send(&mut ws, json!({ "type": "auth", "token": token })).await;
    let frame = next_of_type(&mut ws, "error").await;
    assert_eq!(frame["message"], "Invalid token");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn test_admin_alert_is_broadcast(pool: PgPool) {
    let state = common::test_state(pool.clone());
    let app = common::build_app(state.clone());
    let (_, admin) = common::user_with_token(app.clone(), &pool, "ops@example.com", Role::Admin).await;
    let addr = serve(state).await;
    let mut ws = connect(addr).await;
    authenticate(&mut ws, &admin).await;

    let body = json!({ "level": "critical", "message": "Disk full", "details": { "node": "db-1" } });
    let response = common::post_json_auth(app, "/api/admin/alerts", &admin, body).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["data"]["delivered"], 1);

    let frame = next_of_type(&mut ws, "alert").await;
    assert_eq!(frame["level"], "critical");
    assert_eq!(frame["message"], "Disk full");
    assert_eq!(frame["details"]["node"], "db-1");
}

/// Audit entries are pushed to admin sockets only; user sockets still see
/// the entity event that accompanies them.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_audit_log_created_reaches_admins_only(pool: PgPool) {
    let state = common::test_state(pool.clone());
    let app = common::build_app(state.clone());
    let (_, admin) = common::user_with_token(app.clone(), &pool, "root@example.com", Role::Admin).await;
    let (_, member) = common::user_with_token(app.clone(), &pool, "m@example.com", Role::User).await;
    let addr = serve(state).await;

    let mut ws_admin = connect(addr).await;
    let mut ws_member = connect(addr).await;
    authenticate(&mut ws_admin, &admin).await;
    authenticate(&mut ws_member, &member).await;

    let body = json!({ "key": "maintenance_window", "value": "sun 02:00" });
    let response = common::post_json_auth(app, "/api/admin/config", &admin, body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let frame = next_of_type(&mut ws_admin, "audit_log_created").await;
    assert_eq!(frame["data"]["action"], "CONFIG_UPDATED");
    assert_eq!(frame["data"]["details"]["key"], "maintenance_window");

    // The audit push precedes config_updated on a socket, so anything the
    // member was sent first would show up here.
    loop {
        let frame = next_frame(&mut ws_member).await;
        assert_ne!(frame["type"], "audit_log_created", "member saw {frame}");
        if frame["type"] == "config_updated" {
            break;
        }
    }
    assert_silent_for(&mut ws_member, "audit_log_created").await;
}

/// Authentication is followed by a snapshot of the latest metrics and
/// config; audit rows are included for admins only.
#[sqlx::test(migrations = "../db/migrations")]
async fn test_initial_data_follows_auth(pool: PgPool) {
    let state = common::test_state(pool.clone());
    let app = common::build_app(state.clone());
    let (_, admin) = common::user_with_token(app.clone(), &pool, "admin@example.com", Role::Admin).await;
    let (_, member) = common::user_with_token(app.clone(), &pool, "member@example.com", Role::User).await;

    for (kind, value) in [("cpu_utilization", 30), ("memory_usage", 55)] {
        let body = json!({ "type": kind, "value": value });
        let response = common::post_json_auth(app.clone(), "/api/metrics", &member, body).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    let body = json!({ "key": "theme", "value": "dark" });
    let response = common::post_json_auth(app, "/api/admin/config", &admin, body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let addr = serve(state).await;

    let mut ws = connect(addr).await;
    send(&mut ws, json!({ "type": "auth", "token": member })).await;
    assert_eq!(next_frame(&mut ws).await["type"], "auth_success");
    let frame = next_frame(&mut ws).await;
    assert_eq!(frame["type"], "initial_data");
    let metrics = frame["data"]["metrics"].as_array().unwrap();
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[0]["type"], "memory_usage");
    assert_eq!(frame["data"]["config"][0]["key"], "theme");
    assert_eq!(frame["data"]["audit_logs"], json!([]));

    let mut ws = connect(addr).await;
    authenticate(&mut ws, &admin).await;
    let frame = next_of_type(&mut ws, "initial_data").await;
    assert_eq!(frame["data"]["metrics"].as_array().unwrap().len(), 2);
    assert!(!frame["data"]["audit_logs"].as_array().unwrap().is_empty());
}
