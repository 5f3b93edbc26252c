use thiserror::Error;

/// Error kinds shared across every component, mapped at the edge to the
/// Validation / Authorization / StateConflict / Degraded / Sandbox / Internal
/// taxonomy.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn code(&self) -> &'static str {
        match self {
            CoreError::Config(_) => "CONFIG_ERROR",
            CoreError::Validation { .. } => "VALIDATION_ERROR",
            CoreError::Database(_) => "DATABASE_ERROR",
            CoreError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
