//! Route definitions for data export.

use axum::routing::get;
use axum::Router;

use crate::handlers::export;
use crate::state::AppState;

/// Routes mounted at `/export`.
///
/// All routes require the `admin` role. Each accepts
/// `?format=json|csv&from=&to=`.
///
/// ```text
/// GET /metrics        -> metrics
/// GET /audit-logs     -> audit_logs
/// GET /ai-models      -> ai_models
/// GET /config         -> config
/// GET /system-report  -> system_report (JSON only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/metrics", get(export::metrics))
        .route("/audit-logs", get(export::audit_logs))
        .route("/ai-models", get(export::ai_models))
        .route("/config", get(export::config))
        .route("/system-report", get(export::system_report))
}
