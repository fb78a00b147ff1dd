//! Audit log entity model and DTOs.
//!
//! Audit logs have no `updated_at` field (immutable records).

use pulseboard_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single audit log entry. `user_id` is `None` for system events.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: DbId,
    pub user_id: Option<DbId>,
    pub action: String,
    pub resource: String,
    pub details: Option<serde_json::Value>,
    pub timestamp: Timestamp,
}

/// DTO for inserting a new audit log entry.
#[derive(Debug, Clone)]
pub struct CreateAuditLog {
    pub user_id: Option<DbId>,
    pub action: String,
    pub resource: String,
    pub details: Option<serde_json::Value>,
}

impl CreateAuditLog {
    pub fn new(action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            user_id: None,
            action: action.into(),
            resource: resource.into(),
            details: None,
        }
    }

    pub fn by(mut self, user_id: DbId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Filter parameters for querying audit logs.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub user_id: Option<DbId>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
}

/// Row count per action (used by the system report).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditActionCount {
    pub action: String,
    pub count: i64,
}
