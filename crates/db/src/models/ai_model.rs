//! AI model registry entity and DTOs.

use pulseboard_core::ai_models::ModelStatus;
use pulseboard_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from `ai_models`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct AiModel {
    pub id: DbId,
    pub name: String,
    pub version: String,
    pub status: String,
    pub compliance: String,
    pub security: String,
    pub config: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a model record.
#[derive(Debug, Clone)]
pub struct CreateAiModel {
    pub name: String,
    pub version: String,
    pub status: ModelStatus,
    pub compliance: String,
    pub security: String,
    pub config: Option<serde_json::Value>,
}

/// DTO for a partial update. Only non-`None` fields are applied.
#[derive(Debug, Clone, Default)]
pub struct UpdateAiModel {
    pub name: Option<String>,
    pub version: Option<String>,
    pub status: Option<ModelStatus>,
    pub compliance: Option<String>,
    pub security: Option<String>,
    pub config: Option<serde_json::Value>,
}
