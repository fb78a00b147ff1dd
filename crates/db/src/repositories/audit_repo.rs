//! Repository for the append-only `audit_logs` table.

use pulseboard_core::types::Timestamp;
use sqlx::PgPool;

use crate::models::audit::{AuditActionCount, AuditFilter, AuditLog, CreateAuditLog};

const COLUMNS: &str = "id, user_id, action, resource, details, timestamp";

/// Default page size for audit queries.
pub const DEFAULT_LIMIT: i64 = 100;

/// Hard cap on rows returned by an export.
pub const EXPORT_MAX_ROWS: i64 = 50_000;

/// Hard cap on rows returned by an audit query.
pub const MAX_LIMIT: i64 = 1000;

/// Provides insert and query operations for audit logs.
pub struct AuditLogRepo;

impl AuditLogRepo {
    /// Append an audit entry, returning it.
    pub async fn create(pool: &PgPool, input: &CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_logs (user_id, action, resource, details)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(input.user_id)
            .bind(&input.action)
            .bind(&input.resource)
            .bind(&input.details)
            .fetch_one(pool)
            .await
    }

    /// Query audit logs with filtering, newest first.
    pub async fn query(pool: &PgPool, filter: &AuditFilter) -> Result<Vec<AuditLog>, sqlx::Error> {
        let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs
             WHERE ($1::BIGINT IS NULL OR user_id = $1)
               AND ($2::TIMESTAMPTZ IS NULL OR timestamp >= $2)
               AND ($3::TIMESTAMPTZ IS NULL OR timestamp <= $3)
             ORDER BY timestamp DESC, id DESC
             LIMIT $4"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(filter.user_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// All rows inside an optional time range, oldest first, for export.
    /// Capped at [`EXPORT_MAX_ROWS`].
    pub async fn export_range(
        pool: &PgPool,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs
             WHERE ($1::TIMESTAMPTZ IS NULL OR timestamp >= $1)
               AND ($2::TIMESTAMPTZ IS NULL OR timestamp <= $2)
             ORDER BY timestamp ASC, id ASC
             LIMIT $3"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(from)
            .bind(to)
            .bind(EXPORT_MAX_ROWS)
            .fetch_all(pool)
            .await
    }

    /// Row counts grouped by action, most frequent first.
    pub async fn count_by_action(
        pool: &PgPool,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
    ) -> Result<Vec<AuditActionCount>, sqlx::Error> {
        sqlx::query_as::<_, AuditActionCount>(
            "SELECT action, COUNT(*)::BIGINT AS count FROM audit_logs
             WHERE ($1::TIMESTAMPTZ IS NULL OR timestamp >= $1)
               AND ($2::TIMESTAMPTZ IS NULL OR timestamp <= $2)
             GROUP BY action
             ORDER BY count DESC, action ASC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }
}
