//! Real-time wire messages.
//!
//! Both directions are JSON objects tagged by `type`. Every server message
//! also carries a `timestamp`, added when it is framed.

use chrono::Utc;
use pulseboard_core::roles::Role;
use pulseboard_core::types::{DbId, Timestamp};
use pulseboard_db::models::ai_model::AiModel;
use pulseboard_db::models::audit::AuditLog;
use pulseboard_db::models::config_entry::ConfigEntry;
use pulseboard_db::models::metric::Metric;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Channels a subscription covers when the client names none.
pub const DEFAULT_CHANNELS: [&str; 3] = ["metrics", "alerts", "audit"];

pub const MSG_INVALID_FORMAT: &str = "Invalid message format";
pub const MSG_UNKNOWN_TYPE: &str = "Unknown message type";
pub const MSG_TOKEN_REQUIRED: &str = "Token required";
pub const MSG_INVALID_TOKEN: &str = "Invalid token";
pub const MSG_AUTH_REQUIRED: &str = "Authentication required";
pub const MSG_BINARY_UNSUPPORTED: &str = "Binary messages are not supported";

// ---------------------------------------------------------------------------
// Client -> server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Auth {
        #[serde(default)]
        token: Option<String>,
        #[serde(default)]
        user_agent: Option<String>,
    },
    Subscribe {
        #[serde(default)]
        channels: Option<Vec<String>>,
    },
    Ping,
}

/// Why an inbound text frame could not be turned into a [`ClientMessage`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InboundError {
    #[error("Invalid message format")]
    Malformed,
    #[error("Unknown message type: {0}")]
    UnknownType(String),
}

impl InboundError {
    /// The text sent back to the client.
    pub fn client_message(&self) -> &'static str {
        match self {
            InboundError::Malformed => MSG_INVALID_FORMAT,
            InboundError::UnknownType(_) => MSG_UNKNOWN_TYPE,
        }
    }
}

const KNOWN_TYPES: [&str; 3] = ["auth", "subscribe", "ping"];

/// Parse an inbound text frame, telling unknown types apart from garbage.
pub fn parse_client_message(text: &str) -> Result<ClientMessage, InboundError> {
    let value: Value = serde_json::from_str(text).map_err(|_| InboundError::Malformed)?;
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or(InboundError::Malformed)?;
    if !KNOWN_TYPES.contains(&kind) {
        return Err(InboundError::UnknownType(kind.to_string()));
    }
    serde_json::from_value(value).map_err(|_| InboundError::Malformed)
}

// ---------------------------------------------------------------------------
// Server -> client
// ---------------------------------------------------------------------------

/// Identity echoed back on successful real-time authentication.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HubUser {
    pub id: DbId,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

/// State pushed once, right after a connection authenticates.
#[derive(Debug, Clone, Serialize)]
pub struct InitialSnapshot {
    pub metrics: Vec<Metric>,
    pub config: Vec<ConfigEntry>,
    /// Empty unless the user may read the audit trail.
    pub audit_logs: Vec<AuditLog>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connection {
        connection_id: String,
        message: String,
    },
    AuthSuccess {
        user: HubUser,
    },
    InitialData {
        data: InitialSnapshot,
    },
    Error {
        message: String,
    },
    Subscribed {
        channels: Vec<String>,
    },
    Pong,
    MetricsUpdate {
        data: Vec<Metric>,
    },
    MetricCreated {
        data: Metric,
    },
    AiModelCreated {
        data: AiModel,
    },
    AiModelUpdated {
        data: AiModel,
    },
    AiModelDeleted {
        id: DbId,
    },
    ConfigUpdated {
        data: ConfigEntry,
    },
    AuditLogCreated {
        data: AuditLog,
    },
    Alert {
        level: AlertLevel,
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<Value>,
    },
}

#[derive(Serialize)]
struct Framed<'a> {
    #[serde(flatten)]
    message: &'a ServerMessage,
    timestamp: Timestamp,
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// Serialize with the current time as `timestamp`.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&Framed {
            message: self,
            timestamp: Utc::now(),
        })
    }
}
