//! Route definitions for the audit trail.

use axum::routing::get;
use axum::Router;

use crate::handlers::audit;
use crate::state::AppState;

/// Routes mounted at `/audit-logs`. Admin only.
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(audit::list))
}
