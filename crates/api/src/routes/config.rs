//! Route definitions for the user-facing config view.
//!
//! Admin config management lives under `/admin/config` (see [`super::admin`]).

use axum::routing::get;
use axum::Router;

use crate::handlers::config;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/config", get(config::list_public))
}
