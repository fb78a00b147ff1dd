//! Handlers for `/export`. Admin only, behind the export rate limit tier.
//!
//! Every successful export is audited as `DATA_EXPORTED`.

use axum::extract::{Query, State};
use axum::response::Response;
use chrono::Utc;
use pulseboard_core::audit::{actions, resources};
use pulseboard_core::export::{DateRange, ExportFormat};
use pulseboard_core::types::{DbId, Timestamp};
use pulseboard_db::models::ai_model::AiModel;
use pulseboard_db::models::audit::{AuditActionCount, AuditFilter, AuditLog, CreateAuditLog};
use pulseboard_db::models::config_entry::ConfigEntry;
use pulseboard_db::models::metric::{Metric, MetricFilter, MetricTypeCount};
use pulseboard_db::repositories::{
    AiModelRepo, AuditLogRepo, ConfigRepo, MetricRepo, SessionRepo, UserRepo,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::audit_trail;
use crate::error::{AppError, AppResult};
use crate::export::{attachment, filename, render, CsvRecord};
use crate::middleware::rbac::RequireAdmin;
use crate::query::parse_range;
use crate::state::AppState;

/// Rows of each kind included in the system report's "recent" sections.
const REPORT_RECENT_ROWS: i64 = 20;

/// Query parameters shared by every export endpoint.
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub format: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

struct ExportRequest {
    format: ExportFormat,
    from: Option<Timestamp>,
    to: Option<Timestamp>,
}

impl ExportParams {
    fn parse(&self) -> AppResult<ExportRequest> {
        let format = match self.format.as_deref().map(str::trim) {
            None | Some("") => ExportFormat::default(),
            Some(raw) => raw.parse()?,
        };
        let (from, to) = parse_range(self.from.as_deref(), self.to.as_deref())?;
        Ok(ExportRequest { format, from, to })
    }
}

fn in_range(ts: &Timestamp, from: Option<Timestamp>, to: Option<Timestamp>) -> bool {
    from.is_none_or(|f| *ts >= f) && to.is_none_or(|t| *ts <= t)
}

/// Render, audit, and wrap rows of one entity kind.
async fn respond<T: Serialize + CsvRecord>(
    state: &AppState,
    actor: DbId,
    kind: &str,
    req: &ExportRequest,
    rows: &[T],
) -> AppResult<Response> {
    let now = Utc::now();
    let body = render(
        rows,
        req.format,
        DateRange {
            from: req.from,
            to: req.to,
        },
        now,
    )?;

    audit_trail::record(
        state,
        CreateAuditLog::new(actions::DATA_EXPORTED, resources::EXPORT)
            .by(actor)
            .with_details(json!({
                "kind": kind,
                "format": req.format.extension(),
                "records": rows.len(),
            })),
    )
    .await?;
    tracing::info!(user_id = actor, kind, records = rows.len(), "Data exported");

    Ok(attachment(body, req.format, &filename(kind, req.format, now)))
}

/// GET /api/export/metrics
pub async fn metrics(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(params): Query<ExportParams>,
) -> AppResult<Response> {
    let req = params.parse()?;
    let rows: Vec<Metric> = MetricRepo::export_range(&state.pool, req.from, req.to).await?;
    respond(&state, admin.user_id, "metrics", &req, &rows).await
}

/// GET /api/export/audit-logs
pub async fn audit_logs(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(params): Query<ExportParams>,
) -> AppResult<Response> {
    let req = params.parse()?;
    let rows: Vec<AuditLog> = AuditLogRepo::export_range(&state.pool, req.from, req.to).await?;
    respond(&state, admin.user_id, "audit-logs", &req, &rows).await
}

/// GET /api/export/ai-models
///
/// The range filters on `created_at`.
pub async fn ai_models(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(params): Query<ExportParams>,
) -> AppResult<Response> {
    let req = params.parse()?;
    let rows: Vec<AiModel> = AiModelRepo::list(&state.pool)
        .await?
        .into_iter()
        .filter(|m| in_range(&m.created_at, req.from, req.to))
        .collect();
    respond(&state, admin.user_id, "ai-models", &req, &rows).await
}

/// GET /api/export/config
///
/// The range filters on `updated_at`.
pub async fn config(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(params): Query<ExportParams>,
) -> AppResult<Response> {
    let req = params.parse()?;
    let rows: Vec<ConfigEntry> = ConfigRepo::list(&state.pool)
        .await?
        .into_iter()
        .filter(|c| in_range(&c.updated_at, req.from, req.to))
        .collect();
    respond(&state, admin.user_id, "config", &req, &rows).await
}

// ---------------------------------------------------------------------------
// System report
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SystemReport {
    pub generated_at: Timestamp,
    /// Window applied to every metric and audit section.
    pub date_range: DateRange,
    pub summary: ReportSummary,
    pub metrics_by_type: Vec<MetricTypeCount>,
    pub audit_by_action: Vec<AuditActionCount>,
    pub recent_metrics: Vec<Metric>,
    pub recent_audit_logs: Vec<AuditLog>,
    pub ai_models: Vec<AiModel>,
    pub config: Vec<ConfigEntry>,
}

#[derive(Debug, Serialize)]
pub struct ReportSummary {
    pub total_users: i64,
    pub active_sessions: i64,
    pub total_metrics: i64,
    pub total_audit_entries: i64,
    pub total_ai_models: usize,
    pub active_ai_models: i64,
    pub realtime_connections: usize,
}

/// GET /api/export/system-report
///
/// JSON only; asking for CSV is a 400.
pub async fn system_report(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Query(params): Query<ExportParams>,
) -> AppResult<Response> {
    let req = params.parse()?;
    if req.format != ExportFormat::Json {
        return Err(AppError::BadRequest(
            "System report is only available as JSON".into(),
        ));
    }

    let now = Utc::now();
    let metrics_by_type = MetricRepo::count_by_type(&state.pool, req.from, req.to).await?;
    let audit_by_action = AuditLogRepo::count_by_action(&state.pool, req.from, req.to).await?;
    let ai_models = AiModelRepo::list(&state.pool).await?;

    let summary = ReportSummary {
        total_users: UserRepo::count(&state.pool).await?,
        active_sessions: SessionRepo::count_active(&state.pool, now).await?,
        total_metrics: metrics_by_type.iter().map(|c| c.count).sum(),
        total_audit_entries: audit_by_action.iter().map(|c| c.count).sum(),
        total_ai_models: ai_models.len(),
        active_ai_models: AiModelRepo::count_active(&state.pool).await?,
        realtime_connections: state.hub.connection_count().await,
    };

    let report = SystemReport {
        generated_at: now,
        date_range: DateRange {
            from: req.from,
            to: req.to,
        },
        summary,
        metrics_by_type,
        audit_by_action,
        recent_metrics: MetricRepo::query(
            &state.pool,
            &MetricFilter {
                from: req.from,
                to: req.to,
                limit: Some(REPORT_RECENT_ROWS),
                ..Default::default()
            },
        )
        .await?,
        recent_audit_logs: AuditLogRepo::query(
            &state.pool,
            &AuditFilter {
                from: req.from,
                to: req.to,
                limit: Some(REPORT_RECENT_ROWS),
                ..Default::default()
            },
        )
        .await?,
        ai_models,
        config: ConfigRepo::list(&state.pool).await?,
    };

    let body = serde_json::to_string_pretty(&report)
        .map_err(|e| AppError::InternalError(format!("Report serialization failed: {e}")))?;

    audit_trail::record(
        &state,
        CreateAuditLog::new(actions::DATA_EXPORTED, resources::EXPORT)
            .by(admin.user_id)
            .with_details(json!({ "kind": "system-report", "format": "json" })),
    )
    .await?;

    Ok(attachment(
        body,
        ExportFormat::Json,
        &filename("system-report", ExportFormat::Json, now),
    ))
}
