use thiserror::Error;

/// Per-test failures are not errors (§4.6) — only these three conditions
/// surface to the caller as a hard failure of the whole submission.
#[derive(Debug, Error)]
pub enum CodeRunnerError {
    #[error("sandbox isolation primitive is unavailable on this host")]
    SandboxUnavailable,

    #[error("language not supported: {0}")]
    LanguageUnsupported(String),

    #[error("question has no test cases")]
    QuestionHasNoTests,

    #[error("process spawn failed: {0}")]
    Spawn(String),

    #[error("io error: {0}")]
    Io(String),
}

impl CodeRunnerError {
    pub fn code(&self) -> &'static str {
        match self {
            CodeRunnerError::SandboxUnavailable => "SANDBOX_UNAVAILABLE",
            CodeRunnerError::LanguageUnsupported(_) => "LANGUAGE_UNSUPPORTED",
            CodeRunnerError::QuestionHasNoTests => "QUESTION_HAS_NO_TESTS",
            CodeRunnerError::Spawn(_) => "SPAWN_FAILED",
            CodeRunnerError::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, CodeRunnerError>;
