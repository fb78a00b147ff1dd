use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::hub::RealtimeHub;

/// Interval between heartbeat pings (in seconds).
const HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Send periodic Ping frames to every connection until `cancel` fires.
pub async fn run(hub: Arc<RealtimeHub>, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(Duration::from_secs(HEARTBEAT_INTERVAL_SECS));
    // The first tick completes immediately; skip it.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Heartbeat stopping");
                break;
            }
            _ = interval.tick() => {
                let count = hub.connection_count().await;
                tracing::debug!(count, "Real-time heartbeat ping");
                hub.ping_all().await;
            }
        }
    }
}
