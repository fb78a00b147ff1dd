use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Not-found for an entity addressed by its numeric id.
    pub fn not_found(entity: &'static str, id: DbId) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Not-found for an entity addressed by a natural key (e.g. a config key).
    pub fn not_found_key(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: key.into(),
        }
    }
}
