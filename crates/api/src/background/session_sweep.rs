//! Periodic deletion of expired sessions.

use std::time::Duration;

use chrono::Utc;
use pulseboard_db::repositories::SessionRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Run the session sweep loop until `cancel` is triggered.
///
/// The first sweep runs immediately so sessions that expired while the
/// server was down are cleared at startup.
pub async fn run(pool: PgPool, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Session sweep started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session sweep stopping");
                break;
            }
            _ = interval.tick() => {
                match SessionRepo::cleanup_expired(&pool, Utc::now()).await {
                    Ok(0) => tracing::debug!("Session sweep: nothing expired"),
                    Ok(deleted) => tracing::info!(deleted, "Session sweep: removed expired sessions"),
                    Err(e) => tracing::error!(error = %e, "Session sweep failed"),
                }
            }
        }
    }
}
