//! Route definitions for the `/admin` resource.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{admin, config};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// Role checks happen in the handler extractors.
///
/// ```text
/// GET  /config         -> config::list (admin)
/// POST /config         -> config::upsert (admin)
/// GET  /config/{key}   -> config::get (admin)
/// GET  /users          -> list_users (admin)
/// PUT  /users/{id}     -> update_user (superadmin)
/// POST /alerts         -> send_alert (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/config", get(config::list).post(config::upsert))
        .route("/config/{key}", get(config::get))
        .route("/users", get(admin::list_users))
        .route("/users/{id}", put(admin::update_user))
        .route("/alerts", post(admin::send_alert))
}
