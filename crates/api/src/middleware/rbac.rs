//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! meet the minimum requirement with 403.

use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::request::Parts;
use pulseboard_core::audit::actions;
use pulseboard_db::models::audit::CreateAuditLog;
use serde_json::json;

use super::auth::AuthUser;
use super::client::ClientInfo;
use crate::audit_trail;
use crate::error::AppError;
use crate::state::AppState;

pub const MSG_INSUFFICIENT_PRIVILEGE: &str = "Insufficient privilege";

/// Requires `admin` or `superadmin`.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            return Err(AppError::forbidden(MSG_INSUFFICIENT_PRIVILEGE));
        }
        Ok(RequireAdmin(user))
    }
}

/// Requires `superadmin`.
///
/// A denial is recorded as an `UNAUTHORIZED_ACCESS_ATTEMPT` audit entry
/// before the 403 is returned.
pub struct RequireSuperAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireSuperAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role.is_superadmin() {
            return Ok(RequireSuperAdmin(user));
        }

        let client = ClientInfo::from_parts(
            &parts.headers,
            &parts.extensions,
            &state.config.trusted_proxies,
        );
        // Nested routers see a stripped URI; audit the full request path.
        let path = parts
            .extensions
            .get::<OriginalUri>()
            .map_or_else(|| parts.uri.path(), |uri| uri.path())
            .to_string();
        tracing::warn!(
            user_id = user.user_id,
            role = %user.role,
            path = %path,
            "Super-admin route denied"
        );

        let entry = CreateAuditLog::new(actions::UNAUTHORIZED_ACCESS_ATTEMPT, path.clone())
            .by(user.user_id)
            .with_details(json!({
                "email": user.email,
                "resource": path,
                "method": parts.method.as_str(),
                "ip_address": client.ip.to_string(),
                "user_agent": client.user_agent,
            }));
        // The denial stands even if the audit write fails.
        if let Err(e) = audit_trail::record(state, entry).await {
            tracing::error!(error = %e, "Failed to audit denied access");
        }

        Err(AppError::forbidden(MSG_INSUFFICIENT_PRIVILEGE))
    }
}
