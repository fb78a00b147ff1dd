pub mod admin;
pub mod ai_models;
pub mod audit;
pub mod auth;
pub mod config;
pub mod export;
pub mod health;
pub mod metrics;

use axum::middleware::from_fn_with_state;
use axum::Router;

use crate::middleware::rate_limit::enforce_rate_limit;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /health                      service + database health (not rate limited)
///
/// /auth/register               register (public, auth tier)
/// /auth/login                  login (public, auth tier)
/// /auth/logout                 logout (requires auth)
/// /auth/me                     current user (requires auth)
///
/// /metrics                     list, record (requires auth)
/// /config                      read-only config view (requires auth)
///
/// /admin/config                list, upsert (admin only)
/// /admin/config/{key}          get (admin only)
/// /admin/users                 list (admin only)
/// /admin/users/{id}            update role / active flag (superadmin only)
/// /admin/alerts                broadcast alert (admin only)
///
/// /ai-models                   list (auth), create (admin)
/// /ai-models/{id}              get (auth), update (admin), delete (superadmin)
///
/// /audit-logs                  query (admin only)
///
/// /export/metrics              download (admin only, export tier)
/// /export/audit-logs
/// /export/ai-models
/// /export/config
/// /export/system-report        JSON only
/// ```
///
/// Every route except `/health` passes through the general API rate limit;
/// `/auth` and `/export` additionally pass through their own tier.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let auth = auth::router().layer(from_fn_with_state(
        state.rate_limits.auth.clone(),
        enforce_rate_limit,
    ));
    let export = export::router().layer(from_fn_with_state(
        state.rate_limits.export.clone(),
        enforce_rate_limit,
    ));

    Router::new()
        .nest("/auth", auth)
        .merge(metrics::router())
        .merge(config::router())
        .nest("/admin", admin::router())
        .nest("/ai-models", ai_models::router())
        .nest("/audit-logs", audit::router())
        .nest("/export", export)
        .layer(from_fn_with_state(
            state.rate_limits.api.clone(),
            enforce_rate_limit,
        ))
        .merge(health::router())
}
