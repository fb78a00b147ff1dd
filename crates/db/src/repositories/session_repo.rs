//! Repository for the `sessions` table.

use pulseboard_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::session::{CreateSession, Session};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, token_hash, expires_at, user_agent, ip_address, created_at";

/// Provides lifecycle operations for login sessions.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<Session, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (user_id, token_hash, expires_at, user_agent, ip_address)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(input.user_id)
            .bind(&input.token_hash)
            .bind(input.expires_at)
            .bind(&input.user_agent)
            .bind(&input.ip_address)
            .fetch_one(pool)
            .await
    }

    /// Find a session by token hash that is still valid at `now`.
    pub async fn find_active(
        pool: &PgPool,
        token_hash: &str,
        now: Timestamp,
    ) -> Result<Option<Session>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM sessions
             WHERE token_hash = $1 AND expires_at > $2"
        );
        sqlx::query_as::<_, Session>(&query)
            .bind(token_hash)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Delete one session. Returns `true` if a row was removed.
    pub async fn delete_by_token_hash(pool: &PgPool, token_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every session belonging to a user. Returns the count removed.
    pub async fn delete_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete sessions with `expires_at <= cutoff`. Returns the count removed.
    ///
    /// `cutoff` is captured once by the caller so a sweep is a single
    /// consistent pass; running it twice with the same cutoff removes nothing
    /// the second time.
    pub async fn cleanup_expired(pool: &PgPool, cutoff: Timestamp) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Number of sessions valid at `now`.
    pub async fn count_active(pool: &PgPool, now: Timestamp) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*)::BIGINT FROM sessions WHERE expires_at > $1")
            .bind(now)
            .fetch_one(pool)
            .await
    }
}
