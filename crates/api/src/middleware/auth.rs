//! Bearer-token authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;
use pulseboard_core::roles::Role;
use pulseboard_core::types::DbId;
use pulseboard_db::repositories::{SessionRepo, UserRepo};

use crate::auth::token::hash_token;
use crate::error::AppError;
use crate::state::AppState;

pub const MSG_TOKEN_REQUIRED: &str = "Access token required";
pub const MSG_TOKEN_INVALID: &str = "Invalid or expired token";

/// Authenticated user resolved from an `Authorization: Bearer` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: DbId,
    pub email: String,
    pub role: Role,
    /// Hash of the presented token; identifies the session for logout.
    pub token_hash: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthorized(MSG_TOKEN_REQUIRED))?;

        resolve_session(state, token)
            .await?
            .ok_or_else(|| AppError::unauthorized(MSG_TOKEN_INVALID))
    }
}

/// Resolve a bearer token to an active user.
///
/// Order matters: the session store is consulted before the signature, so
/// a logged-out token is rejected even while its signature is still valid.
/// Every failure collapses to `Ok(None)`; only infrastructure errors surface.
/// Shared by the HTTP gate and the real-time `auth` message.
pub async fn resolve_session(
    state: &AppState,
    token: &str,
) -> Result<Option<AuthUser>, sqlx::Error> {
    let token_hash = hash_token(token);

    let Some(session) = SessionRepo::find_active(&state.pool, &token_hash, Utc::now()).await?
    else {
        return Ok(None);
    };

    let Some(verified) = state.tokens.verify(token) else {
        return Ok(None);
    };
    if verified.user_id != session.user_id {
        tracing::warn!(
            session_user = session.user_id,
            token_user = verified.user_id,
            "Session and token subject disagree"
        );
        return Ok(None);
    }

    let user = match UserRepo::find_by_id(&state.pool, verified.user_id).await? {
        Some(user) if user.is_active => user,
        _ => return Ok(None),
    };

    Ok(Some(AuthUser {
        user_id: user.id,
        role: user.role(),
        email: user.email,
        token_hash,
    }))
}
