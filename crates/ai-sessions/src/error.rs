use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionsError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("question not found: {0}")]
    QuestionNotFound(String),

    #[error("session is terminal and accepts no further operations: {0}")]
    SessionTerminal(String),

    #[error("question already answered: {0}")]
    AlreadyAnswered(String),

    #[error("follow-up question submitted before its parent was answered: {0}")]
    ParentUnanswered(String),

    #[error("session cannot progress to question flow until ID verification succeeds: {0}")]
    IdVerificationRequired(String),

    #[error("ID verification requires exactly 2 faces in frame, found {found}: {session_id}")]
    WrongFaceCount { session_id: String, found: u32 },

    #[error("token invalid or expired")]
    TokenInvalid,

    #[error("scheduler error: {0}")]
    Scheduler(#[from] ai_scheduler::SchedulerError),

    #[error("gateway error: {0}")]
    Gateway(#[from] ai_gateway::GatewayError),

    #[error("code runner error: {0}")]
    CodeRunner(#[from] ai_coderunner::CodeRunnerError),

    #[error("core error: {0}")]
    Core(#[from] ai_core::error::CoreError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl SessionsError {
    pub fn code(&self) -> &'static str {
        match self {
            SessionsError::SessionNotFound(_) => "SESSION_NOT_FOUND",
            SessionsError::QuestionNotFound(_) => "QUESTION_NOT_FOUND",
            SessionsError::SessionTerminal(_) => "SESSION_TERMINAL",
            SessionsError::AlreadyAnswered(_) => "ALREADY_ANSWERED",
            SessionsError::ParentUnanswered(_) => "PARENT_UNANSWERED",
            SessionsError::IdVerificationRequired(_) => "ID_VERIFICATION_REQUIRED",
            SessionsError::WrongFaceCount { .. } => "WRONG_FACE_COUNT",
            SessionsError::TokenInvalid => "TOKEN_INVALID",
            SessionsError::Scheduler(_) => "SCHEDULER_ERROR",
            SessionsError::Gateway(_) => "GATEWAY_ERROR",
            SessionsError::CodeRunner(_) => "CODE_RUNNER_ERROR",
            SessionsError::Core(_) => "CORE_ERROR",
            SessionsError::Database(_) => "DATABASE_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionsError>;
