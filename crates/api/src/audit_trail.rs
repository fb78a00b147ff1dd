//! Audit writes from request handlers.
//!
//! Entries are persisted through the store, then announced as
//! `audit_log_created` to admin and superadmin connections only. Generator
//! system entries bypass this module and are never pushed.

use pulseboard_core::roles::Role;
use pulseboard_db::models::audit::{AuditLog, CreateAuditLog};
use pulseboard_db::repositories::AuditLogRepo;

use crate::state::AppState;
use crate::ws::ServerMessage;

/// Roles allowed to read the audit trail, over HTTP or the socket.
pub const AUDIT_READERS: &[Role] = &[Role::Admin, Role::SuperAdmin];

/// Persist an audit entry and push it to audit readers.
pub async fn record(state: &AppState, entry: CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
    let log = AuditLogRepo::create(&state.pool, &entry).await?;
    state
        .hub
        .broadcast_to_roles(AUDIT_READERS, &ServerMessage::AuditLogCreated { data: log.clone() })
        .await;
    Ok(log)
}
