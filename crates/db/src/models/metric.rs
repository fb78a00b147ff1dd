//! Metric entity model and DTOs. Metrics are append-only.

use pulseboard_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A metric row. Serialized with the category under `type`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Metric {
    pub id: DbId,
    #[serde(rename = "type")]
    pub metric_type: String,
    pub value: i32,
    pub metadata: Option<serde_json::Value>,
    pub timestamp: Timestamp,
}

/// DTO for inserting a metric.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMetric {
    #[serde(rename = "type")]
    pub metric_type: String,
    pub value: i32,
    pub metadata: Option<serde_json::Value>,
}

/// Filter for metric range queries. All fields optional.
#[derive(Debug, Clone, Default)]
pub struct MetricFilter {
    pub metric_type: Option<String>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
}

/// Row count per metric type (used by the system report).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MetricTypeCount {
    #[serde(rename = "type")]
    pub metric_type: String,
    pub count: i64,
}
