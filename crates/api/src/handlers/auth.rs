//! Handlers for the `/auth` resource (register, login, logout, me).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use pulseboard_core::audit::{actions, resources};
use pulseboard_core::error::CoreError;
use pulseboard_core::roles::Role;
use pulseboard_core::types::Timestamp;
use pulseboard_core::validation::validate_input;
use pulseboard_db::models::audit::CreateAuditLog;
use pulseboard_db::models::session::CreateSession;
use pulseboard_db::models::user::{CreateUser, User, UserResponse};
use pulseboard_db::repositories::{SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use crate::audit_trail;
use crate::auth::password::{hash_password, verify_dummy, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::client::ClientInfo;
use crate::state::AppState;

/// Deliberately identical for unknown email, wrong password, and inactive account.
const MSG_INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Returned for a taken email; says nothing about whether the account exists.
pub const MSG_REGISTRATION_FAILED: &str = "Unable to register with the provided details";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful authentication response returned by register and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: Timestamp,
    pub user: UserResponse,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/register
///
/// Create a `user`-role account and sign it in.
pub async fn register(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    validate_input(&input)?;
    let email = normalize_email(&input.email);

    // Hash first so a taken email costs the same as a fresh one.
    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    if UserRepo::find_by_email(&state.pool, &email).await?.is_some() {
        tracing::info!("Registration rejected for existing email");
        return Err(AppError::BadRequest(MSG_REGISTRATION_FAILED.into()));
    }

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            email,
            password_hash,
            role: Role::User,
        },
    )
    .await
    .map_err(|e| {
        // Lost a race with a concurrent registration for the same email.
        let taken = matches!(&e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"));
        if taken {
            AppError::BadRequest(MSG_REGISTRATION_FAILED.into())
        } else {
            AppError::Database(e)
        }
    })?;
    tracing::info!(user_id = user.id, "User registered");

    audit_trail::record(
        &state,
        CreateAuditLog::new(actions::USER_REGISTERED, resources::USER)
            .by(user.id)
            .with_details(json!({ "email": user.email, "ip_address": client.ip.to_string() })),
    )
    .await?;

    let response = start_session(&state, &user, &client).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
///
/// Authenticate with email + password and open a session.
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = normalize_email(&input.email);

    let Some(user) = UserRepo::find_by_email(&state.pool, &email).await? else {
        verify_dummy(&input.password);
        return Err(AppError::unauthorized(MSG_INVALID_CREDENTIALS));
    };

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid || !user.is_active {
        tracing::info!(user_id = user.id, active = user.is_active, "Login rejected");
        return Err(AppError::unauthorized(MSG_INVALID_CREDENTIALS));
    }

    UserRepo::record_login(&state.pool, user.id, Utc::now()).await?;

    audit_trail::record(
        &state,
        CreateAuditLog::new(actions::LOGIN, resources::AUTH)
            .by(user.id)
            .with_details(json!({
                "ip_address": client.ip.to_string(),
                "user_agent": client.user_agent,
            })),
    )
    .await?;

    let response = start_session(&state, &user, &client).await?;
    Ok(Json(response))
}

/// POST /api/auth/logout
///
/// Delete the caller's session. The token stops working immediately.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> AppResult<StatusCode> {
    SessionRepo::delete_by_token_hash(&state.pool, &auth.token_hash).await?;

    audit_trail::record(
        &state,
        CreateAuditLog::new(actions::LOGOUT, resources::AUTH).by(auth.user_id),
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/auth/me
pub async fn me(State(state): State<AppState>, auth: AuthUser) -> AppResult<Json<UserResponse>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("User", auth.user_id)))?;
    Ok(Json(UserResponse::from(&user)))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Issue a token and persist its session row.
async fn start_session(
    state: &AppState,
    user: &User,
    client: &ClientInfo,
) -> AppResult<AuthResponse> {
    let issued = state
        .tokens
        .issue(user.id, Some(&user.email))
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    SessionRepo::create(
        &state.pool,
        &CreateSession {
            user_id: user.id,
            token_hash: issued.token_hash,
            expires_at: issued.expires_at,
            user_agent: client.user_agent.clone(),
            ip_address: Some(client.ip.to_string()),
        },
    )
    .await?;

    Ok(AuthResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user: UserResponse::from(user),
    })
}
