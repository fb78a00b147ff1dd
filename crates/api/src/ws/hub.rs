//! Connection registry and fan-out for real-time clients.
//!
//! Each connection moves `Connected` -> `Authenticated` -> `Subscribed`;
//! closing removes it from the registry. Broadcasts only reach connections
//! that have authenticated. Every connection owns an unbounded outbound
//! queue drained by its socket task, so per-connection ordering is kept and
//! the registry lock is never held across socket I/O.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::ws::Message;
use pulseboard_core::roles::Role;
use pulseboard_core::types::{DbId, Timestamp};
use tokio::sync::{mpsc, RwLock};

use super::messages::{HubUser, ServerMessage, DEFAULT_CHANNELS};

/// Channel sender half for pushing messages to a connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Authenticated,
    Subscribed,
}

impl ConnectionState {
    fn receives_broadcasts(self) -> bool {
        !matches!(self, ConnectionState::Connected)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HubError {
    #[error("connection is not registered")]
    UnknownConnection,
    #[error("connection has not authenticated")]
    NotAuthenticated,
}

struct Connection {
    sender: WsSender,
    state: ConnectionState,
    user: Option<HubUser>,
    channels: Vec<String>,
    connected_at: Timestamp,
}

/// Thread-safe registry of live connections; wrap in `Arc` and share.
pub struct RealtimeHub {
    connections: RwLock<HashMap<String, Connection>>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new connection in the `Connected` state.
    ///
    /// Returns the receiver half of its outbound queue.
    pub async fn register(&self, conn_id: String) -> mpsc::UnboundedReceiver<Message> {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Connection {
            sender: tx,
            state: ConnectionState::Connected,
            user: None,
            channels: Vec::new(),
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        rx
    }

    /// Remove a connection. Unknown ids are ignored.
    pub async fn remove(&self, conn_id: &str) {
        if let Some(conn) = self.connections.write().await.remove(conn_id) {
            let secs = (chrono::Utc::now() - conn.connected_at).num_seconds();
            tracing::debug!(conn_id, connected_secs = secs, "Connection deregistered");
        }
    }

    /// Bind a user to the connection. Re-authentication replaces the user
    /// and keeps any existing subscription.
    pub async fn authenticate(&self, conn_id: &str, user: HubUser) -> Result<(), HubError> {
        let mut conns = self.connections.write().await;
        let conn = conns.get_mut(conn_id).ok_or(HubError::UnknownConnection)?;
        conn.user = Some(user);
        if conn.state == ConnectionState::Connected {
            conn.state = ConnectionState::Authenticated;
        }
        Ok(())
    }

    /// Record channel subscriptions, defaulting to [`DEFAULT_CHANNELS`].
    ///
    /// Returns the channels now recorded.
    pub async fn subscribe(
        &self,
        conn_id: &str,
        channels: Option<Vec<String>>,
    ) -> Result<Vec<String>, HubError> {
        let mut conns = self.connections.write().await;
        let conn = conns.get_mut(conn_id).ok_or(HubError::UnknownConnection)?;
        if !conn.state.receives_broadcasts() {
            return Err(HubError::NotAuthenticated);
        }
        let channels = match channels {
            Some(list) if !list.is_empty() => list,
            _ => DEFAULT_CHANNELS.iter().map(|c| c.to_string()).collect(),
        };
        conn.channels = channels.clone();
        conn.state = ConnectionState::Subscribed;
        Ok(channels)
    }

    pub async fn state(&self, conn_id: &str) -> Option<ConnectionState> {
        self.connections.read().await.get(conn_id).map(|c| c.state)
    }

    pub async fn user_id(&self, conn_id: &str) -> Option<DbId> {
        self.connections
            .read()
            .await
            .get(conn_id)
            .and_then(|c| c.user.as_ref().map(|u| u.id))
    }

    pub async fn channels(&self, conn_id: &str) -> Vec<String> {
        self.connections
            .read()
            .await
            .get(conn_id)
            .map(|c| c.channels.clone())
            .unwrap_or_default()
    }

    /// Send directly to one connection regardless of its state.
    ///
    /// Used for replies (acks, errors, pong). Returns `false` if the
    /// connection is gone.
    pub async fn send_to(&self, conn_id: &str, message: &ServerMessage) -> bool {
        let Some(frame) = encode(message) else {
            return false;
        };
        let conns = self.connections.read().await;
        match conns.get(conn_id) {
            Some(conn) => conn.sender.send(frame).is_ok(),
            None => false,
        }
    }

    /// Deliver to every authenticated connection. Returns the number reached.
    pub async fn broadcast(&self, message: &ServerMessage) -> usize {
        self.fan_out(message, |_| true).await
    }

    /// Deliver to authenticated connections bound to any of `user_ids`.
    pub async fn broadcast_to_users(&self, user_ids: &[DbId], message: &ServerMessage) -> usize {
        self.fan_out(message, |user| user.is_some_and(|u| user_ids.contains(&u.id)))
            .await
    }

    /// Deliver to authenticated connections whose user holds one of `roles`.
    pub async fn broadcast_to_roles(&self, roles: &[Role], message: &ServerMessage) -> usize {
        self.fan_out(message, |user| user.is_some_and(|u| roles.contains(&u.role)))
            .await
    }

    async fn fan_out<F>(&self, message: &ServerMessage, wanted: F) -> usize
    where
        F: Fn(Option<&HubUser>) -> bool,
    {
        let Some(frame) = encode(message) else {
            return 0;
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        {
            let conns = self.connections.read().await;
            for (id, conn) in conns.iter() {
                if !conn.state.receives_broadcasts() || !wanted(conn.user.as_ref()) {
                    continue;
                }
                if conn.sender.send(frame.clone()).is_ok() {
                    delivered += 1;
                } else {
                    dead.push(id.clone());
                }
            }
        }

        if !dead.is_empty() {
            let mut conns = self.connections.write().await;
            for id in &dead {
                conns.remove(id);
            }
            tracing::debug!(removed = dead.len(), "Dropped closed real-time connections");
        }
        delivered
    }

    /// Number of registered connections in any state.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Number of connections that would receive a broadcast.
    pub async fn authenticated_count(&self) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|c| c.state.receives_broadcasts())
            .count()
    }

    /// Send a transport-level Ping frame to every connection.
    pub async fn ping_all(&self) {
        let conns = self.connections.read().await;
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }

    /// Send a Close frame to every connection, then clear the registry.
    pub async fn shutdown(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for conn in conns.values() {
            let _ = conn.sender.send(Message::Close(None));
        }
        conns.clear();
        tracing::info!(count, "Closed all real-time connections");
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(message: &ServerMessage) -> Option<Message> {
    match message.to_frame() {
        Ok(text) => Some(Message::Text(text.into())),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize real-time message");
            None
        }
    }
}
