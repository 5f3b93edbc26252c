use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("candidate not found: {0}")]
    CandidateNotFound(String),

    #[error("candidate email already registered for this tenant: {0}")]
    DuplicateEmail(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl DirectoryError {
    pub fn code(&self) -> &'static str {
        match self {
            DirectoryError::JobNotFound(_) => "JOB_NOT_FOUND",
            DirectoryError::CandidateNotFound(_) => "CANDIDATE_NOT_FOUND",
            DirectoryError::DuplicateEmail(_) => "DUPLICATE_EMAIL",
            DirectoryError::Database(_) => "DATABASE_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, DirectoryError>;
