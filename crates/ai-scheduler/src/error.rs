use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid window: end must be after start")]
    InvalidWindow,

    #[error("invalid capacity: must be >= 1")]
    InvalidCapacity,

    #[error("job not configured: coding language is unset for job {0}")]
    JobNotConfigured(String),

    #[error("slot not found: {0}")]
    SlotNotFound(String),

    #[error("slot is cancelled: {0}")]
    SlotCancelled(String),

    #[error("slot full: {0}")]
    SlotFull(String),

    #[error("interview not found: {0}")]
    InterviewNotFound(String),

    #[error("schedule not found: {0}")]
    ScheduleNotFound(String),

    #[error("invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("directory error: {0}")]
    Directory(#[from] ai_directory::error::DirectoryError),

    #[error("core error: {0}")]
    Core(#[from] ai_core::error::CoreError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

impl SchedulerError {
    pub fn code(&self) -> &'static str {
        match self {
            SchedulerError::InvalidWindow => "INVALID_WINDOW",
            SchedulerError::InvalidCapacity => "INVALID_CAPACITY",
            SchedulerError::JobNotConfigured(_) => "JOB_NOT_CONFIGURED",
            SchedulerError::SlotNotFound(_) => "SLOT_NOT_FOUND",
            SchedulerError::SlotCancelled(_) => "SLOT_CANCELLED",
            SchedulerError::SlotFull(_) => "SLOT_FULL",
            SchedulerError::InterviewNotFound(_) => "INTERVIEW_NOT_FOUND",
            SchedulerError::ScheduleNotFound(_) => "SCHEDULE_NOT_FOUND",
            SchedulerError::InvalidTimezone(_) => "INVALID_TIMEZONE",
            SchedulerError::Directory(_) => "DIRECTORY_ERROR",
            SchedulerError::Core(_) => "CORE_ERROR",
            SchedulerError::Database(_) => "DATABASE_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
