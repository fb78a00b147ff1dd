//! Route definitions for metrics.

use axum::routing::get;
use axum::Router;

use crate::handlers::metrics;
use crate::state::AppState;

/// ```text
/// GET  /metrics  -> list
/// POST /metrics  -> create
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics::list).post(metrics::create))
}
