use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed or missing input. Callers must not persist anything.
    #[error("Validation error on '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("Invalid goal for unit '{business_unit_id}' period {period_key}: {reason}")]
    InvalidGoal {
        business_unit_id: String,
        period_key: String,
        reason: String,
    },

    #[error("Invalid period key '{0}', expected YYYY-MM")]
    InvalidPeriod(String),

    #[error("{entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EngineError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
