//! Repository for the append-only `metrics` table.

use pulseboard_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::metric::{CreateMetric, Metric, MetricFilter, MetricTypeCount};

const COLUMNS: &str = "id, metric_type, value, metadata, timestamp";

/// Default page size for metric queries.
pub const DEFAULT_LIMIT: i64 = 100;

/// Hard cap on rows returned by an export.
pub const EXPORT_MAX_ROWS: i64 = 50_000;

/// Hard cap on rows returned by a metric query.
pub const MAX_LIMIT: i64 = 1000;

/// Insert and read operations for metrics. There is no update or delete.
pub struct MetricRepo;

impl MetricRepo {
    /// Append a metric row, returning it.
    pub async fn create(pool: &PgPool, input: &CreateMetric) -> Result<Metric, sqlx::Error> {
        let query = format!(
            "INSERT INTO metrics (metric_type, value, metadata)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Metric>(&query)
            .bind(&input.metric_type)
            .bind(input.value)
            .bind(&input.metadata)
            .fetch_one(pool)
            .await
    }

    /// Filtered query, newest first. The limit defaults to [`DEFAULT_LIMIT`]
    /// and is clamped to `1..=MAX_LIMIT`.
    pub async fn query(pool: &PgPool, filter: &MetricFilter) -> Result<Vec<Metric>, sqlx::Error> {
        let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let query = format!(
            "SELECT {COLUMNS} FROM metrics
             WHERE ($1::TEXT IS NULL OR metric_type = $1)
               AND ($2::TIMESTAMPTZ IS NULL OR timestamp >= $2)
               AND ($3::TIMESTAMPTZ IS NULL OR timestamp <= $3)
             ORDER BY timestamp DESC, id DESC
             LIMIT $4"
        );
        sqlx::query_as::<_, Metric>(&query)
            .bind(&filter.metric_type)
            .bind(filter.from)
            .bind(filter.to)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// The `limit` most recently inserted rows, newest first.
    pub async fn latest(pool: &PgPool, limit: i64) -> Result<Vec<Metric>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM metrics ORDER BY id DESC LIMIT $1");
        sqlx::query_as::<_, Metric>(&query)
            .bind(limit.clamp(1, MAX_LIMIT))
            .fetch_all(pool)
            .await
    }

    /// All rows inside an optional time range, oldest first, for export.
    /// Capped at [`EXPORT_MAX_ROWS`].
    pub async fn export_range(
        pool: &PgPool,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
    ) -> Result<Vec<Metric>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM metrics
             WHERE ($1::TIMESTAMPTZ IS NULL OR timestamp >= $1)
               AND ($2::TIMESTAMPTZ IS NULL OR timestamp <= $2)
             ORDER BY timestamp ASC, id ASC
             LIMIT $3"
        );
        sqlx::query_as::<_, Metric>(&query)
            .bind(from)
            .bind(to)
            .bind(EXPORT_MAX_ROWS)
            .fetch_all(pool)
            .await
    }

    /// Row counts grouped by metric type inside an optional time range,
    /// most frequent first.
    pub async fn count_by_type(
        pool: &PgPool,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
    ) -> Result<Vec<MetricTypeCount>, sqlx::Error> {
        sqlx::query_as::<_, MetricTypeCount>(
            "SELECT metric_type, COUNT(*)::BIGINT AS count FROM metrics
             WHERE ($1::TIMESTAMPTZ IS NULL OR timestamp >= $1)
               AND ($2::TIMESTAMPTZ IS NULL OR timestamp <= $2)
             GROUP BY metric_type
             ORDER BY count DESC, metric_type ASC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }
}
