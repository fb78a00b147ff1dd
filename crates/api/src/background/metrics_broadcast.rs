//! Periodic push of the latest metrics to real-time clients.
//!
//! Each tick reads the newest rows, broadcasts them as `metrics_update`, and
//! raises a warning `alert` for every row not seen on a previous tick whose
//! value breaches its threshold. A tick with no rows sends nothing.

use std::sync::Arc;

use pulseboard_core::metrics::breaches_threshold;
use pulseboard_core::types::DbId;
use pulseboard_db::models::metric::Metric;
use pulseboard_db::repositories::MetricRepo;
use serde_json::json;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::config::BroadcastConfig;
use crate::ws::{AlertLevel, RealtimeHub, ServerMessage};

/// Run the broadcast loop until `cancel` is triggered.
pub async fn run(
    pool: PgPool,
    hub: Arc<RealtimeHub>,
    config: BroadcastConfig,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = config.interval.as_secs(),
        batch = config.batch,
        "Metrics broadcast started"
    );

    let mut interval = tokio::time::interval(config.interval);
    let mut last_seen: Option<DbId> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Metrics broadcast stopping");
                break;
            }
            _ = interval.tick() => {
                let rows = match MetricRepo::latest(&pool, config.batch).await {
                    Ok(rows) => rows,
                    Err(e) => {
                        tracing::error!(error = %e, "Metrics broadcast: query failed");
                        continue;
                    }
                };
                if rows.is_empty() {
                    // Nothing stored yet, so every future row is new.
                    last_seen.get_or_insert(0);
                    continue;
                }

                let (alerts, newest) = threshold_alerts(&rows, last_seen);
                last_seen = newest;

                let delivered = hub.broadcast(&ServerMessage::MetricsUpdate { data: rows }).await;
                tracing::debug!(delivered, "Metrics broadcast tick");

                for alert in &alerts {
                    hub.broadcast(alert).await;
                }
                if !alerts.is_empty() {
                    tracing::info!(count = alerts.len(), "Metrics broadcast: threshold alerts raised");
                }
            }
        }
    }
}

/// Alerts for rows newer than `last_seen`, plus the newest id in `rows`.
///
/// With no previous tick (`last_seen == None`) the batch only establishes
/// the baseline, so a restart does not replay old alerts.
pub fn threshold_alerts(rows: &[Metric], last_seen: Option<DbId>) -> (Vec<ServerMessage>, Option<DbId>) {
    let newest = rows.iter().map(|m| m.id).max();
    let Some(seen) = last_seen else {
        return (Vec::new(), newest);
    };

    let alerts = rows
        .iter()
        .filter(|m| m.id > seen)
        .filter(|m| breaches_threshold(&m.metric_type, m.value, m.metadata.as_ref()))
        .map(|m| ServerMessage::Alert {
            level: AlertLevel::Warning,
            message: format!("{} at {} exceeds threshold", m.metric_type, m.value),
            details: Some(json!({
                "metric_id": m.id,
                "type": m.metric_type,
                "value": m.value,
            })),
        })
        .collect();

    (alerts, newest)
}
