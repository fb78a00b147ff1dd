//! Repository for the `config_entries` key/value table.

use sqlx::PgPool;

use crate::models::config_entry::{ConfigEntry, UpsertConfig};

const COLUMNS: &str = "id, key, value, description, updated_by, updated_at";

/// Provides get/list/upsert for configuration entries.
pub struct ConfigRepo;

impl ConfigRepo {
    /// Find an entry by key.
    pub async fn get(pool: &PgPool, key: &str) -> Result<Option<ConfigEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM config_entries WHERE key = $1");
        sqlx::query_as::<_, ConfigEntry>(&query)
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// List all entries ordered by key.
    pub async fn list(pool: &PgPool) -> Result<Vec<ConfigEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM config_entries ORDER BY key ASC");
        sqlx::query_as::<_, ConfigEntry>(&query).fetch_all(pool).await
    }

    /// Insert or overwrite an entry in one statement.
    ///
    /// `updated_at` never moves backwards: it is the later of the current
    /// time and the previous value.
    pub async fn upsert(pool: &PgPool, input: &UpsertConfig) -> Result<ConfigEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO config_entries (key, value, description, updated_by)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                description = EXCLUDED.description,
                updated_by = EXCLUDED.updated_by,
                updated_at = GREATEST(NOW(), config_entries.updated_at)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ConfigEntry>(&query)
            .bind(&input.key)
            .bind(&input.value)
            .bind(&input.description)
            .bind(input.updated_by)
            .fetch_one(pool)
            .await
    }
}
