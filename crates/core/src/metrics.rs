//! Synthetic metric catalog and generation rules.
//!
//! The generator produces demo load, not measurements. Each metric type has
//! a fixed half-open value range and a fixed metadata shape; every sample
//! produced here stays inside its type's range.

use std::ops::Range;
use std::time::Duration;

use rand::Rng;
use serde_json::{json, Value};

use crate::audit::{SYSTEM_ACTIONS, SYSTEM_RESOURCES};

/// Probability that a generator tick also emits a synthetic audit entry.
pub const SYSTEM_EVENT_PROBABILITY: f64 = 0.3;

/// Maximum number of metric rows produced per generator tick.
pub const MAX_SAMPLES_PER_TICK: usize = 3;

/// Threshold used for percentage metrics that carry no explicit threshold.
pub const DEFAULT_PERCENT_THRESHOLD: i64 = 85;

pub const SYSTEM_LOAD: &str = "system_load";
pub const CPU_UTILIZATION: &str = "cpu_utilization";
pub const MEMORY_USAGE: &str = "memory_usage";
pub const NETWORK_ACTIVITY: &str = "network_activity";
pub const DATABASE_QUERIES: &str = "database_queries";
pub const API_REQUESTS: &str = "api_requests";
pub const SECURITY_SCANS: &str = "security_scans";
pub const CONSOLE_ATTEMPTS: &str = "console_attempts";

/// One entry in the metric catalog.
#[derive(Debug, Clone)]
pub struct MetricKind {
    pub name: &'static str,
    /// Half-open range of generated values.
    pub range: Range<i32>,
    /// Whether values are percentages (and therefore alertable).
    pub percentage: bool,
}

/// Every metric type the generator knows about.
pub const CATALOG: &[MetricKind] = &[
    MetricKind { name: SYSTEM_LOAD, range: 0..100, percentage: true },
    MetricKind { name: CPU_UTILIZATION, range: 0..100, percentage: true },
    MetricKind { name: MEMORY_USAGE, range: 30..70, percentage: false },
    MetricKind { name: NETWORK_ACTIVITY, range: 0..1000, percentage: false },
    MetricKind { name: DATABASE_QUERIES, range: 50..250, percentage: false },
    MetricKind { name: API_REQUESTS, range: 100..600, percentage: false },
    MetricKind { name: SECURITY_SCANS, range: 10..60, percentage: false },
    MetricKind { name: CONSOLE_ATTEMPTS, range: 0..5, percentage: false },
];

/// Look up a catalog entry by type name.
pub fn kind(name: &str) -> Option<&'static MetricKind> {
    CATALOG.iter().find(|k| k.name == name)
}

/// A generated metric row, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    pub metric_type: String,
    pub value: i32,
    pub metadata: Value,
}

/// A generated system audit event, ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemEvent {
    pub action: String,
    pub resource: String,
    pub details: Value,
}

/// Produce one generator tick's worth of samples (1 to 3 rows).
pub fn synthesize_batch<R: Rng + ?Sized>(rng: &mut R) -> Vec<MetricSample> {
    let count = rng.random_range(1..=MAX_SAMPLES_PER_TICK);
    (0..count)
        .map(|_| {
            let kind = &CATALOG[rng.random_range(0..CATALOG.len())];
            synthesize(kind, rng)
        })
        .collect()
}

/// Produce a single sample of the given kind.
pub fn synthesize<R: Rng + ?Sized>(kind: &MetricKind, rng: &mut R) -> MetricSample {
    let value = rng.random_range(kind.range.clone());

    let metadata = match kind.name {
        SYSTEM_LOAD => json!({ "unit": "percentage", "threshold": DEFAULT_PERCENT_THRESHOLD }),
        CPU_UTILIZATION => json!({ "unit": "percentage", "cores": 16 }),
        MEMORY_USAGE => json!({ "unit": "GB", "total_gb": 128 }),
        NETWORK_ACTIVITY => json!({ "unit": "MB/s", "protocol": "HTTPS" }),
        DATABASE_QUERIES => json!({
            "avg_response_ms": rng.random_range(0..100),
            "slow_queries": rng.random_range(0..5),
        }),
        API_REQUESTS => json!({
            "success_rate": rng.random_range(98..=100),
            "avg_latency_ms": rng.random_range(50..250),
        }),
        SECURITY_SCANS => json!({
            "scan_type": "VULNERABILITY_ASSESSMENT",
            "threats_detected": rng.random_range(0..3),
        }),
        CONSOLE_ATTEMPTS => json!({ "source_ip": random_ip(rng), "blocked": true }),
        _ => Value::Null,
    };

    MetricSample {
        metric_type: kind.name.to_string(),
        value,
        metadata,
    }
}

/// With [`SYSTEM_EVENT_PROBABILITY`], produce a synthetic system audit event.
pub fn maybe_system_event<R: Rng + ?Sized>(rng: &mut R) -> Option<SystemEvent> {
    if !rng.random_bool(SYSTEM_EVENT_PROBABILITY) {
        return None;
    }
    let action = SYSTEM_ACTIONS[rng.random_range(0..SYSTEM_ACTIONS.len())];
    let resource = SYSTEM_RESOURCES[rng.random_range(0..SYSTEM_RESOURCES.len())];
    let priority = if action.contains("UNAUTHORIZED") {
        "HIGH"
    } else {
        "NORMAL"
    };

    Some(SystemEvent {
        action: action.to_string(),
        resource: resource.to_string(),
        details: json!({
            "automated": true,
            "system_generated": true,
            "priority": priority,
        }),
    })
}

/// Delay until the next generator tick: `base ± jitter`, never below 1ms.
pub fn next_delay<R: Rng + ?Sized>(base: Duration, jitter: Duration, rng: &mut R) -> Duration {
    let base_ms = base.as_millis() as i64;
    let jitter_ms = jitter.as_millis() as i64;
    let offset = if jitter_ms == 0 {
        0
    } else {
        rng.random_range(-jitter_ms..=jitter_ms)
    };
    Duration::from_millis((base_ms + offset).max(1) as u64)
}

/// Whether a stored metric should raise a real-time alert.
///
/// Only percentage metrics alert; the threshold comes from the row's
/// `threshold` metadata when present.
pub fn breaches_threshold(metric_type: &str, value: i32, metadata: Option<&Value>) -> bool {
    let Some(kind) = kind(metric_type) else {
        return false;
    };
    if !kind.percentage {
        return false;
    }
    let threshold = metadata
        .and_then(|m| m.get("threshold"))
        .and_then(Value::as_i64)
        .unwrap_or(DEFAULT_PERCENT_THRESHOLD);
    i64::from(value) >= threshold
}

fn random_ip<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!(
        "{}.{}.{}.{}",
        rng.random_range(0..=255u8),
        rng.random_range(0..=255u8),
        rng.random_range(0..=255u8),
        rng.random_range(0..=255u8)
    )
}
