//! Handlers for user administration and ad hoc alerts (`/admin`).

use axum::extract::{Path, State};
use axum::Json;
use pulseboard_core::audit::{actions, resources};
use pulseboard_core::error::CoreError;
use pulseboard_core::roles::Role;
use pulseboard_core::types::DbId;
use pulseboard_db::models::audit::CreateAuditLog;
use pulseboard_db::models::user::{UpdateUser, UserResponse};
use pulseboard_db::repositories::{SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::audit_trail;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::{RequireAdmin, RequireSuperAdmin};
use crate::response::DataResponse;
use crate::state::AppState;
use crate::ws::{AlertLevel, ServerMessage};

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `PUT /admin/users/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

/// Request body for `POST /admin/alerts`.
#[derive(Debug, Deserialize)]
pub struct AlertRequest {
    #[serde(default = "default_level")]
    pub level: AlertLevel,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

fn default_level() -> AlertLevel {
    AlertLevel::Info
}

#[derive(Debug, Serialize)]
pub struct AlertDelivery {
    pub delivered: usize,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// GET /api/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let users = UserRepo::list(&state.pool).await?;
    let data = users.iter().map(UserResponse::from).collect();
    Ok(Json(DataResponse { data }))
}

/// PUT /api/admin/users/{id}
///
/// Change a user's role or active flag. Deactivation also ends every
/// session the user holds.
pub async fn update_user(
    State(state): State<AppState>,
    RequireSuperAdmin(actor): RequireSuperAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUserRequest>,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let role = input.role.as_deref().map(str::parse::<Role>).transpose()?;
    if role.is_none() && input.is_active.is_none() {
        return Err(AppError::BadRequest(
            "Provide at least one of 'role' or 'is_active'".into(),
        ));
    }
    if id == actor.user_id {
        return Err(AppError::BadRequest(
            "You cannot change your own role or status".into(),
        ));
    }

    let user = UserRepo::update(
        &state.pool,
        id,
        &UpdateUser {
            role,
            is_active: input.is_active,
        },
    )
    .await?
    .ok_or_else(|| AppError::Core(CoreError::not_found("User", id)))?;

    let mut revoked = 0;
    if input.is_active == Some(false) {
        revoked = SessionRepo::delete_all_for_user(&state.pool, id).await?;
    }
    tracing::info!(user_id = id, actor = actor.user_id, revoked, "User updated");

    audit_trail::record(
        &state,
        CreateAuditLog::new(actions::USER_UPDATED, resources::USER)
            .by(actor.user_id)
            .with_details(json!({
                "target_user_id": id,
                "role": role.map(Role::as_str),
                "is_active": input.is_active,
                "sessions_revoked": revoked,
            })),
    )
    .await?;

    Ok(Json(DataResponse {
        data: UserResponse::from(&user),
    }))
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

/// POST /api/admin/alerts
///
/// Push an `alert` to every authenticated real-time client.
pub async fn send_alert(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<AlertRequest>,
) -> AppResult<Json<DataResponse<AlertDelivery>>> {
    let message = input.message.trim();
    if message.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "message: must not be empty".into(),
        )));
    }

    let delivered = state
        .hub
        .broadcast(&ServerMessage::Alert {
            level: input.level,
            message: message.to_string(),
            details: input.details,
        })
        .await;
    tracing::info!(user_id = admin.user_id, delivered, "Alert broadcast");

    Ok(Json(DataResponse {
        data: AlertDelivery { delivered },
    }))
}
