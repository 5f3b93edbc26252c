use ai_core::ids::{CodeSubmissionId, InterviewId, QuestionId, ResponseId, SessionId, SessionKey};
use ai_directory::types::CodingLanguage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Scheduled,
    Active,
    Paused,
    Completed,
    Expired,
    Error,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "SCHEDULED",
            SessionStatus::Active => "ACTIVE",
            SessionStatus::Paused => "PAUSED",
            SessionStatus::Completed => "COMPLETED",
            SessionStatus::Expired => "EXPIRED",
            SessionStatus::Error => "ERROR",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Expired | SessionStatus::Error)
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHEDULED" => Ok(Self::Scheduled),
            "ACTIVE" => Ok(Self::Active),
            "PAUSED" => Ok(Self::Paused),
            "COMPLETED" => Ok(Self::Completed),
            "EXPIRED" => Ok(Self::Expired),
            "ERROR" => Ok(Self::Error),
            other => Err(format!("unknown session status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdVerificationStatus {
    Pending,
    Verified,
    Failed,
}

impl IdVerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdVerificationStatus::Pending => "PENDING",
            IdVerificationStatus::Verified => "VERIFIED",
            IdVerificationStatus::Failed => "FAILED",
        }
    }
}

impl std::str::FromStr for IdVerificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "VERIFIED" => Ok(Self::Verified),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("unknown id verification status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    IceBreaker,
    Technical,
    Behavioral,
    Coding,
    SystemDesign,
    General,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::IceBreaker => "ICE_BREAKER",
            QuestionType::Technical => "TECHNICAL",
            QuestionType::Behavioral => "BEHAVIORAL",
            QuestionType::Coding => "CODING",
            QuestionType::SystemDesign => "SYSTEM_DESIGN",
            QuestionType::General => "GENERAL",
        }
    }
}

impl std::str::FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ICE_BREAKER" => Ok(Self::IceBreaker),
            "TECHNICAL" => Ok(Self::Technical),
            "BEHAVIORAL" => Ok(Self::Behavioral),
            "CODING" => Ok(Self::Coding),
            "SYSTEM_DESIGN" => Ok(Self::SystemDesign),
            "GENERAL" => Ok(Self::General),
            other => Err(format!("unknown question type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionLevel {
    Main,
    FollowUp,
}

impl QuestionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionLevel::Main => "MAIN",
            QuestionLevel::FollowUp => "FOLLOW_UP",
        }
    }
}

impl std::str::FromStr for QuestionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MAIN" => Ok(Self::Main),
            "FOLLOW_UP" => Ok(Self::FollowUp),
            other => Err(format!("unknown question level: {other}")),
        }
    }
}

/// Order is unique within `(session, level)` for MAIN; FOLLOW_UPs share
/// their parent's order and are totally ordered by creation time (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub session_id: SessionId,
    pub order: u32,
    pub question_type: QuestionType,
    pub level: QuestionLevel,
    pub parent_id: Option<QuestionId>,
    pub text: String,
    pub coding_language: Option<CodingLanguage>,
    pub audio_ref: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseKind {
    Text,
    Audio,
    Code,
}

impl ResponseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKind::Text => "TEXT",
            ResponseKind::Audio => "AUDIO",
            ResponseKind::Code => "CODE",
        }
    }
}

impl std::str::FromStr for ResponseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TEXT" => Ok(Self::Text),
            "AUDIO" => Ok(Self::Audio),
            "CODE" => Ok(Self::Code),
            other => Err(format!("unknown response kind: {other}")),
        }
    }
}

/// Mechanical metrics derived from a transcript (§4.7 item 7). Never
/// substituted for LLM scores — stored alongside them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ResponseMetrics {
    pub filler_word_count: u32,
    pub words_per_minute: f64,
    pub sentiment: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub id: ResponseId,
    pub question_id: QuestionId,
    pub session_id: SessionId,
    pub kind: ResponseKind,
    pub text: String,
    pub submitted_at: String,
    pub duration_seconds: f64,
    pub metrics: Option<ResponseMetrics>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSubmission {
    pub id: CodeSubmissionId,
    pub session_id: SessionId,
    pub question_id: QuestionId,
    pub language: CodingLanguage,
    pub source: String,
    pub passed_all_tests: bool,
    pub output_log: String,
    pub created_at: String,
}

/// Caller-supplied model/voice configuration snapshot, opaque to this crate
/// beyond the two fields the session portal needs (§3 "model configuration").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    pub language: String,
    pub accent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub session_key: SessionKey,
    pub interview_id: InterviewId,
    pub candidate_name: String,
    pub candidate_email: String,
    pub job_description_snapshot: String,
    pub resume_text_snapshot: String,
    pub coding_language: CodingLanguage,
    pub model_config: ModelConfig,
    pub status: SessionStatus,
    pub current_question_index: u32,
    pub total_questions: u32,
    pub session_started_at: Option<String>,
    pub session_ended_at: Option<String>,
    pub last_heartbeat_at: Option<String>,
    pub id_verification_status: IdVerificationStatus,
    pub id_extracted_name: Option<String>,
    pub id_extracted_number: Option<String>,
    pub error_message: Option<String>,
    pub is_evaluated: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Inbound payload for `submit_response` (§4.3).
pub enum SubmitPayload {
    Text(String),
    Audio { bytes: Vec<u8>, mime: String },
    Code { source: String, language: CodingLanguage },
}

pub struct StartOutcome {
    pub session: Session,
    pub questions: Vec<Question>,
    pub degraded: bool,
}

pub struct SubmitOutcome {
    pub next_question_id: Option<QuestionId>,
    pub follow_up: Option<Question>,
    pub degraded: bool,
}
