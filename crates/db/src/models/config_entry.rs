//! Configuration key/value entity.

use pulseboard_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from `config_entries`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub id: DbId,
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub updated_by: Option<DbId>,
    pub updated_at: Timestamp,
}

/// DTO for an upsert. `updated_by` is supplied by the caller, not the client.
#[derive(Debug, Clone)]
pub struct UpsertConfig {
    pub key: String,
    pub value: String,
    pub description: Option<String>,
    pub updated_by: Option<DbId>,
}
