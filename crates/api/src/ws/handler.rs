use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use pulseboard_core::audit::{actions, resources};
use pulseboard_core::roles::Role;
use pulseboard_db::models::audit::{AuditFilter, CreateAuditLog};
use pulseboard_db::repositories::{AuditLogRepo, ConfigRepo, MetricRepo};
use serde_json::json;

use super::hub::HubError;
use super::messages::{
    parse_client_message, ClientMessage, HubUser, InitialSnapshot, ServerMessage,
    MSG_AUTH_REQUIRED, MSG_BINARY_UNSUPPORTED, MSG_INVALID_TOKEN, MSG_TOKEN_REQUIRED,
};
use crate::audit_trail::AUDIT_READERS;
use crate::middleware::auth::resolve_session;
use crate::middleware::client::ClientInfo;
use crate::state::AppState;

/// HTTP handler that upgrades the connection to WebSocket.
///
/// The upgrade itself is public; the connection must send an `auth`
/// message before it receives any broadcast.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    client: ClientInfo,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, client))
}

/// Manage a single connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with the hub and acks it.
///   2. Spawns a sender task that drains the hub's queue into the sink.
///   3. Dispatches inbound messages on the current task.
///   4. Deregisters on disconnect.
async fn handle_socket(socket: WebSocket, state: AppState, client: ClientInfo) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, ip = %client.ip, "WebSocket connected");

    let mut rx = state.hub.register(conn_id.clone()).await;
    let (mut sink, mut stream) = socket.split();

    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    state
        .hub
        .send_to(
            &conn_id,
            &ServerMessage::Connection {
                connection_id: conn_id.clone(),
                message: "Connected to real-time server".into(),
            },
        )
        .await;

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                handle_text(&state, &conn_id, &client, text.as_str()).await;
            }
            Ok(Message::Binary(_)) => {
                reply(&state, &conn_id, ServerMessage::error(MSG_BINARY_UNSUPPORTED)).await;
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(Message::Ping(_)) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    state.hub.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}

async fn handle_text(state: &AppState, conn_id: &str, client: &ClientInfo, text: &str) {
    let message = match parse_client_message(text) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(conn_id, error = %e, "Rejected inbound message");
            reply(state, conn_id, ServerMessage::error(e.client_message())).await;
            return;
        }
    };

    match message {
        ClientMessage::Auth { token, user_agent } => {
            let token = token.unwrap_or_default();
            if token.trim().is_empty() {
                reply(state, conn_id, ServerMessage::error(MSG_TOKEN_REQUIRED)).await;
                return;
            }
            authenticate(state, conn_id, client, token.trim(), user_agent).await;
        }
        ClientMessage::Subscribe { channels } => {
            let response = match state.hub.subscribe(conn_id, channels).await {
                Ok(channels) => {
                    tracing::debug!(conn_id, ?channels, "Subscribed");
                    ServerMessage::Subscribed { channels }
                }
                Err(HubError::NotAuthenticated) => ServerMessage::error(MSG_AUTH_REQUIRED),
                Err(HubError::UnknownConnection) => return,
            };
            reply(state, conn_id, response).await;
        }
        ClientMessage::Ping => reply(state, conn_id, ServerMessage::Pong).await,
    }
}

async fn authenticate(
    state: &AppState,
    conn_id: &str,
    client: &ClientInfo,
    token: &str,
    user_agent: Option<String>,
) {
    let user = match resolve_session(state, token).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            tracing::debug!(conn_id, "Real-time auth rejected");
            reply(state, conn_id, ServerMessage::error(MSG_INVALID_TOKEN)).await;
            return;
        }
        Err(e) => {
            tracing::error!(conn_id, error = %e, "Real-time auth lookup failed");
            reply(state, conn_id, ServerMessage::error("Authentication failed")).await;
            return;
        }
    };

    let hub_user = HubUser {
        id: user.user_id,
        email: user.email.clone(),
        role: user.role,
    };
    if state.hub.authenticate(conn_id, hub_user.clone()).await.is_err() {
        return;
    }
    tracing::info!(conn_id, user_id = user.user_id, "Real-time connection authenticated");

    let entry = CreateAuditLog::new(actions::WEBSOCKET_AUTH, resources::REALTIME_CONNECTION)
        .by(user.user_id)
        .with_details(json!({
            "connection_id": conn_id,
            "ip_address": client.ip.to_string(),
            "user_agent": user_agent.or_else(|| client.user_agent.clone()),
        }));
    if let Err(e) = AuditLogRepo::create(&state.pool, &entry).await {
        tracing::error!(conn_id, error = %e, "Failed to audit real-time auth");
    }

    let role = hub_user.role;
    reply(state, conn_id, ServerMessage::AuthSuccess { user: hub_user }).await;

    match initial_snapshot(state, role).await {
        Ok(data) => reply(state, conn_id, ServerMessage::InitialData { data }).await,
        Err(e) => tracing::error!(conn_id, error = %e, "Failed to load initial real-time data"),
    }
}

/// Metrics in the initial snapshot.
const INITIAL_METRICS: i64 = 50;
/// Audit rows in the initial snapshot, for audit readers only.
const INITIAL_AUDIT_LOGS: i64 = 20;

async fn initial_snapshot(state: &AppState, role: Role) -> Result<InitialSnapshot, sqlx::Error> {
    let metrics = MetricRepo::latest(&state.pool, INITIAL_METRICS).await?;
    let config = ConfigRepo::list(&state.pool).await?;
    let audit_logs = if AUDIT_READERS.contains(&role) {
        AuditLogRepo::query(
            &state.pool,
            &AuditFilter {
                limit: Some(INITIAL_AUDIT_LOGS),
                ..Default::default()
            },
        )
        .await?
    } else {
        Vec::new()
    };
    Ok(InitialSnapshot {
        metrics,
        config,
        audit_logs,
    })
}

async fn reply(state: &AppState, conn_id: &str, message: ServerMessage) {
    state.hub.send_to(conn_id, &message).await;
}
