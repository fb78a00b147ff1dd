//! Handlers for `/metrics`.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use pulseboard_core::validation::validate_input;
use pulseboard_db::models::metric::{CreateMetric, Metric, MetricFilter};
use pulseboard_db::repositories::MetricRepo;
use serde::Deserialize;
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::query::parse_range;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::ws::ServerMessage;

/// Query parameters for `GET /metrics`.
#[derive(Debug, Deserialize)]
pub struct MetricQueryParams {
    #[serde(rename = "type")]
    pub metric_type: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<i64>,
}

/// Request body for `POST /metrics`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMetricRequest {
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub metric_type: String,
    pub value: i32,
    pub metadata: Option<serde_json::Value>,
}

/// GET /api/metrics?type&from&to&limit
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<MetricQueryParams>,
) -> AppResult<Json<DataResponse<Vec<Metric>>>> {
    let (from, to) = parse_range(params.from.as_deref(), params.to.as_deref())?;
    let filter = MetricFilter {
        metric_type: params.metric_type.filter(|t| !t.is_empty()),
        from,
        to,
        limit: params.limit,
    };
    let data = MetricRepo::query(&state.pool, &filter).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /api/metrics
///
/// Append a metric and push `metric_created` to real-time clients.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateMetricRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Metric>>)> {
    validate_input(&input)?;
    let metric = MetricRepo::create(
        &state.pool,
        &CreateMetric {
            metric_type: input.metric_type,
            value: input.value,
            metadata: input.metadata,
        },
    )
    .await?;

    let delivered = state
        .hub
        .broadcast(&ServerMessage::MetricCreated {
            data: metric.clone(),
        })
        .await;
    tracing::debug!(
        metric_id = metric.id,
        user_id = auth.user_id,
        delivered,
        "Metric created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: metric })))
}
