//! Shared HTTP error shape. Handlers map their manager's `.code()` into an
//! error-kind class per §7, the same way `skynet-gateway`'s handlers each
//! build a `(StatusCode, Json<...Error>)` pair, just centralized since C8
//! fronts nine different error enums instead of one.

use axum::http::StatusCode;
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

impl ErrorBody {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code,
        }
    }
}

/// Classifies a `.code()` string into the §7 error-kind taxonomy and picks
/// the matching HTTP status. Unknown codes fall back to 500 — `Internal`.
pub fn status_for_code(code: &str) -> StatusCode {
    match code {
        "VALIDATION_ERROR" | "INVALID_WINDOW" | "INVALID_CAPACITY" | "INVALID_TIMEZONE"
        | "LANGUAGE_UNSUPPORTED" | "QUESTION_HAS_NO_TESTS" | "DUPLICATE_EMAIL" | "JOB_NOT_CONFIGURED" => {
            StatusCode::BAD_REQUEST
        }

        "TOKEN_INVALID" | "ID_VERIFICATION_REQUIRED" => StatusCode::UNAUTHORIZED,

        "WRONG_FACE_COUNT" => StatusCode::BAD_REQUEST,

        "JOB_NOT_FOUND" | "CANDIDATE_NOT_FOUND" | "SLOT_NOT_FOUND" | "INTERVIEW_NOT_FOUND"
        | "SCHEDULE_NOT_FOUND" | "SESSION_NOT_FOUND" | "QUESTION_NOT_FOUND" | "MONITOR_NOT_FOUND" => {
            StatusCode::NOT_FOUND
        }

        "SLOT_CANCELLED" | "SLOT_FULL" | "SESSION_TERMINAL" | "ALREADY_ANSWERED" | "PARENT_UNANSWERED"
        | "MONITOR_ALREADY_ACTIVE" | "NO_RESPONSES" | "SESSION_NOT_COMPLETED" => StatusCode::CONFLICT,

        "QUOTA_EXHAUSTED_HARD_FAIL" | "PROVIDER_ERROR" | "DETECTOR_FAILURE" => StatusCode::SERVICE_UNAVAILABLE,

        "SANDBOX_UNAVAILABLE" | "SPAWN_FAILED" => StatusCode::INTERNAL_SERVER_ERROR,

        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
