//! Route definitions for the `/ai-models` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::ai_models;
use crate::state::AppState;

/// Routes mounted at `/ai-models`.
///
/// ```text
/// GET    /      -> list (auth)
/// POST   /      -> create (admin)
/// GET    /{id}  -> get (auth)
/// PUT    /{id}  -> update (admin)
/// DELETE /{id}  -> delete (superadmin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(ai_models::list).post(ai_models::create))
        .route(
            "/{id}",
            get(ai_models::get)
                .put(ai_models::update)
                .delete(ai_models::delete),
        )
}
