//! Handlers for the AI model registry (`/ai-models`).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use pulseboard_core::ai_models::ModelStatus;
use pulseboard_core::audit::{actions, resources};
use pulseboard_core::error::CoreError;
use pulseboard_core::types::DbId;
use pulseboard_core::validation::validate_input;
use pulseboard_db::models::ai_model::{AiModel, CreateAiModel, UpdateAiModel};
use pulseboard_db::models::audit::CreateAuditLog;
use pulseboard_db::repositories::AiModelRepo;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::audit_trail;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::{RequireAdmin, RequireSuperAdmin};
use crate::response::DataResponse;
use crate::state::AppState;
use crate::ws::ServerMessage;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /ai-models`. Status defaults to `active`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAiModelRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "must be 1-50 characters"))]
    pub version: String,
    pub status: Option<String>,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub compliance: String,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub security: String,
    pub config: Option<serde_json::Value>,
}

/// Request body for `PUT /ai-models/{id}`. Absent fields are left unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAiModelRequest {
    #[validate(length(min = 1, max = 200, message = "must be 1-200 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "must be 1-50 characters"))]
    pub version: Option<String>,
    pub status: Option<String>,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub compliance: Option<String>,
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub security: Option<String>,
    pub config: Option<serde_json::Value>,
}

fn parse_status(raw: Option<&str>) -> Result<Option<ModelStatus>, CoreError> {
    raw.map(str::parse).transpose()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/ai-models
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<AiModel>>>> {
    let data = AiModelRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data }))
}

/// GET /api/ai-models/{id}
pub async fn get(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<AiModel>>> {
    let model = AiModelRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("AiModel", id)))?;
    Ok(Json(DataResponse { data: model }))
}

/// POST /api/ai-models
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateAiModelRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<AiModel>>)> {
    validate_input(&input)?;
    let status = parse_status(input.status.as_deref())?.unwrap_or(ModelStatus::Active);

    let model = AiModelRepo::create(
        &state.pool,
        &CreateAiModel {
            name: input.name,
            version: input.version,
            status,
            compliance: input.compliance,
            security: input.security,
            config: input.config,
        },
    )
    .await?;

    audit_trail::record(
        &state,
        CreateAuditLog::new(actions::AI_MODEL_CREATED, resources::AI_MODEL)
            .by(admin.user_id)
            .with_details(json!({ "model_id": model.id, "name": model.name })),
    )
    .await?;
    state
        .hub
        .broadcast(&ServerMessage::AiModelCreated {
            data: model.clone(),
        })
        .await;

    Ok((StatusCode::CREATED, Json(DataResponse { data: model })))
}

/// PUT /api/ai-models/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateAiModelRequest>,
) -> AppResult<Json<DataResponse<AiModel>>> {
    validate_input(&input)?;
    let status = parse_status(input.status.as_deref())?;

    let model = AiModelRepo::update(
        &state.pool,
        id,
        &UpdateAiModel {
            name: input.name,
            version: input.version,
            status,
            compliance: input.compliance,
            security: input.security,
            config: input.config,
        },
    )
    .await?
    .ok_or_else(|| AppError::Core(CoreError::not_found("AiModel", id)))?;

    audit_trail::record(
        &state,
        CreateAuditLog::new(actions::AI_MODEL_UPDATED, resources::AI_MODEL)
            .by(admin.user_id)
            .with_details(json!({ "model_id": model.id, "status": model.status })),
    )
    .await?;
    state
        .hub
        .broadcast(&ServerMessage::AiModelUpdated {
            data: model.clone(),
        })
        .await;

    Ok(Json(DataResponse { data: model }))
}

/// DELETE /api/ai-models/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireSuperAdmin(actor): RequireSuperAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if !AiModelRepo::delete(&state.pool, id).await? {
        return Err(AppError::Core(CoreError::not_found("AiModel", id)));
    }

    audit_trail::record(
        &state,
        CreateAuditLog::new(actions::AI_MODEL_DELETED, resources::AI_MODEL)
            .by(actor.user_id)
            .with_details(json!({ "model_id": id })),
    )
    .await?;
    state
        .hub
        .broadcast(&ServerMessage::AiModelDeleted { id })
        .await;

    Ok(StatusCode::NO_CONTENT)
}
