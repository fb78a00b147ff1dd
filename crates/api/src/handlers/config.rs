//! Handlers for configuration entries (`/config` and `/admin/config`).

use axum::extract::{Path, State};
use axum::Json;
use pulseboard_core::audit::{actions, resources};
use pulseboard_core::error::CoreError;
use pulseboard_core::validation::validate_input;
use pulseboard_db::models::audit::CreateAuditLog;
use pulseboard_db::models::config_entry::{ConfigEntry, UpsertConfig};
use pulseboard_db::repositories::ConfigRepo;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::audit_trail;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::ws::ServerMessage;

/// Request body for `POST /admin/config`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpsertConfigRequest {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub key: String,
    pub value: String,
    pub description: Option<String>,
}

/// GET /api/config
///
/// Read-only view for any signed-in user.
pub async fn list_public(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<ConfigEntry>>>> {
    let data = ConfigRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/admin/config
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<ConfigEntry>>>> {
    let data = ConfigRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/admin/config/{key}
pub async fn get(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<ConfigEntry>>> {
    let entry = ConfigRepo::get(&state.pool, &key)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found_key("ConfigEntry", key)))?;
    Ok(Json(DataResponse { data: entry }))
}

/// POST /api/admin/config
///
/// Insert or overwrite a key, audit it, and push `config_updated`.
pub async fn upsert(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<UpsertConfigRequest>,
) -> AppResult<Json<DataResponse<ConfigEntry>>> {
    validate_input(&input)?;
    let entry = ConfigRepo::upsert(
        &state.pool,
        &UpsertConfig {
            key: input.key,
            value: input.value,
            description: input.description,
            updated_by: Some(admin.user_id),
        },
    )
    .await?;

    audit_trail::record(
        &state,
        CreateAuditLog::new(actions::CONFIG_UPDATED, resources::CONFIG)
            .by(admin.user_id)
            .with_details(json!({ "key": entry.key, "value": entry.value })),
    )
    .await?;

    state
        .hub
        .broadcast(&ServerMessage::ConfigUpdated {
            data: entry.clone(),
        })
        .await;

    Ok(Json(DataResponse { data: entry }))
}
