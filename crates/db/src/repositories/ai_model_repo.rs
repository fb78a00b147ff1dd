//! Repository for the `ai_models` table.

use pulseboard_core::ai_models::ModelStatus;
use pulseboard_core::types::DbId;
use sqlx::PgPool;

use crate::models::ai_model::{AiModel, CreateAiModel, UpdateAiModel};

const COLUMNS: &str = "id, name, version, status, compliance, security, config, \
                        created_at, updated_at";

/// Provides CRUD operations for AI model records.
pub struct AiModelRepo;

impl AiModelRepo {
    /// Insert a new model record, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateAiModel) -> Result<AiModel, sqlx::Error> {
        let query = format!(
            "INSERT INTO ai_models (name, version, status, compliance, security, config)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AiModel>(&query)
            .bind(&input.name)
            .bind(&input.version)
            .bind(input.status.as_str())
            .bind(&input.compliance)
            .bind(&input.security)
            .bind(&input.config)
            .fetch_one(pool)
            .await
    }

    /// List all models ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<AiModel>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ai_models ORDER BY name ASC, id ASC");
        sqlx::query_as::<_, AiModel>(&query).fetch_all(pool).await
    }

    /// Find a model by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<AiModel>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ai_models WHERE id = $1");
        sqlx::query_as::<_, AiModel>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Update a model. Only non-`None` fields in `input` are applied.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateAiModel,
    ) -> Result<Option<AiModel>, sqlx::Error> {
        let query = format!(
            "UPDATE ai_models SET
                name = COALESCE($2, name),
                version = COALESCE($3, version),
                status = COALESCE($4, status),
                compliance = COALESCE($5, compliance),
                security = COALESCE($6, security),
                config = COALESCE($7, config)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AiModel>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.version)
            .bind(input.status.map(ModelStatus::as_str))
            .bind(&input.compliance)
            .bind(&input.security)
            .bind(&input.config)
            .fetch_optional(pool)
            .await
    }

    /// Delete a model. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM ai_models WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Number of models in the `active` or `deployed` state.
    pub async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM ai_models WHERE status IN ('active', 'deployed')",
        )
        .fetch_one(pool)
        .await
    }
}
