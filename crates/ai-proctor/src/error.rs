use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProctorError {
    #[error("no monitor is registered for session {0}")]
    MonitorNotFound(String),

    #[error("a monitor is already registered for session {0}")]
    MonitorAlreadyActive(String),

    #[error("detector '{0}' failed: {1}")]
    DetectorFailure(String, String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("core error: {0}")]
    Core(#[from] ai_core::error::CoreError),
}

impl ProctorError {
    pub fn code(&self) -> &'static str {
        match self {
            ProctorError::MonitorNotFound(_) => "MONITOR_NOT_FOUND",
            ProctorError::MonitorAlreadyActive(_) => "MONITOR_ALREADY_ACTIVE",
            ProctorError::DetectorFailure(_, _) => "DETECTOR_FAILURE",
            ProctorError::Database(_) => "DATABASE_ERROR",
            ProctorError::Core(_) => "CORE_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, ProctorError>;
