use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("session has no responses to evaluate: {0}")]
    NoResponses(String),

    #[error("session is not yet COMPLETED, cannot evaluate: {0}")]
    SessionNotCompleted(String),

    #[error("session error: {0}")]
    Sessions(#[from] ai_sessions::SessionsError),

    #[error("proctor error: {0}")]
    Proctor(#[from] ai_proctor::ProctorError),

    #[error("gateway error: {0}")]
    Gateway(#[from] ai_gateway::GatewayError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl EvaluationError {
    pub fn code(&self) -> &'static str {
        match self {
            EvaluationError::NoResponses(_) => "NO_RESPONSES",
            EvaluationError::SessionNotCompleted(_) => "SESSION_NOT_COMPLETED",
            EvaluationError::Sessions(_) => "SESSIONS_ERROR",
            EvaluationError::Proctor(_) => "PROCTOR_ERROR",
            EvaluationError::Gateway(_) => "GATEWAY_ERROR",
            EvaluationError::Database(_) => "DATABASE_ERROR",
            EvaluationError::Serde(_) => "SERDE_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, EvaluationError>;
