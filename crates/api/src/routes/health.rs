//! Liveness check for load balancers and the dashboard status badge.
//!
//! Mounted at `/api/health`, outside the API rate limit tier.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Ok,
    /// Serving, but the database ping failed.
    Degraded,
}

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: ServiceStatus,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Sockets currently registered with the hub, in any state.
    pub realtime_connections: usize,
    pub generator_enabled: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let db_healthy = match pulseboard_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Health check: database unreachable");
            false
        }
    };

    Json(HealthReport {
        status: if db_healthy {
            ServiceStatus::Ok
        } else {
            ServiceStatus::Degraded
        },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        realtime_connections: state.hub.connection_count().await,
        generator_enabled: state.config.generator.enabled,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
