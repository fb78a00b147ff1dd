//! Handler for audit log queries. Admin only.

use axum::extract::{Query, State};
use axum::Json;
use pulseboard_db::models::audit::{AuditFilter, AuditLog};
use pulseboard_db::repositories::AuditLogRepo;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::query::parse_range;
use crate::response::DataResponse;
use crate::state::AppState;

/// Query parameters for `GET /audit-logs`.
#[derive(Debug, Deserialize)]
pub struct AuditLogQueryParams {
    #[serde(alias = "userId")]
    pub user_id: Option<i64>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<i64>,
}

/// GET /api/audit-logs?user_id&from&to&limit
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(params): Query<AuditLogQueryParams>,
) -> AppResult<Json<DataResponse<Vec<AuditLog>>>> {
    let (from, to) = parse_range(params.from.as_deref(), params.to.as_deref())?;
    let filter = AuditFilter {
        user_id: params.user_id,
        from,
        to,
        limit: params.limit,
    };
    let data = AuditLogRepo::query(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data }))
}
