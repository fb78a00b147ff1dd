//! Synthetic metric generator.
//!
//! Writes demo metric rows (and occasionally a system audit entry) on a
//! jittered timer. Rows are only persisted; clients see them through the
//! periodic broadcast.

use pulseboard_core::metrics::{self, MetricSample, SystemEvent};
use pulseboard_db::models::audit::CreateAuditLog;
use pulseboard_db::models::metric::CreateMetric;
use pulseboard_db::repositories::{AuditLogRepo, MetricRepo};
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use crate::config::GeneratorConfig;

/// Run the generator loop until `cancel` is triggered.
pub async fn run(pool: PgPool, config: GeneratorConfig, cancel: CancellationToken) {
    tracing::info!(
        base_ms = config.base.as_millis() as u64,
        jitter_ms = config.jitter.as_millis() as u64,
        "Metrics generator started"
    );

    loop {
        // ThreadRng is not Send; keep it out of any await.
        let (delay, samples, event) = {
            let mut rng = rand::rng();
            (
                metrics::next_delay(config.base, config.jitter, &mut rng),
                metrics::synthesize_batch(&mut rng),
                metrics::maybe_system_event(&mut rng),
            )
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Metrics generator stopping");
                break;
            }
            _ = tokio::time::sleep(delay) => {
                tick(&pool, samples, event).await;
            }
        }
    }
}

async fn tick(pool: &PgPool, samples: Vec<MetricSample>, event: Option<SystemEvent>) {
    let mut written = 0usize;
    for sample in samples {
        let input = CreateMetric {
            metric_type: sample.metric_type,
            value: sample.value,
            metadata: Some(sample.metadata),
        };
        match MetricRepo::create(pool, &input).await {
            Ok(_) => written += 1,
            Err(e) => tracing::error!(error = %e, metric_type = %input.metric_type, "Generator: metric insert failed"),
        }
    }

    if let Some(event) = event {
        let entry = CreateAuditLog::new(event.action, event.resource).with_details(event.details);
        if let Err(e) = AuditLogRepo::create(pool, &entry).await {
            tracing::error!(error = %e, action = %entry.action, "Generator: system audit insert failed");
        }
    }

    tracing::debug!(written, "Generator tick complete");
}
