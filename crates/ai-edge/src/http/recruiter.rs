//! Authenticated recruiter API (§6): jobs, candidates, slots, interviews,
//! booking/reschedule/cancel, and result lookup. Bearer-token auth against
//! the external auth service is out of scope (§1) the same way the spec
//! treats recruiter identity as an external collaborator; handlers trust
//! the caller the way `skynet-gateway`'s `/chat` trusts a configured token
//! rather than verifying against a user directory it doesn't own.

use std::sync::Arc;

use ai_core::civiltime::format_ist;
use ai_directory::types::{Candidate, CodingLanguage, Job, NewCandidate, NewJob};
use ai_evaluation::EvaluationResult;
use ai_scheduler::{Interview, Slot};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::{status_for_code, ErrorBody};

type ApiError = (StatusCode, Json<ErrorBody>);

#[derive(Deserialize)]
pub struct CreateJobRequest {
    pub tenant_id: String,
    pub title: String,
    pub company: String,
    pub domain: String,
    pub coding_language: CodingLanguage,
    pub description: String,
    #[serde(default)]
    pub tech_stack: Vec<String>,
}

pub async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateJobRequest>,
) -> Result<Json<Job>, ApiError> {
    state
        .directory
        .create_job(NewJob {
            tenant_id: req.tenant_id,
            title: req.title,
            company: req.company,
            domain: req.domain,
            coding_language: req.coding_language,
            description: req.description,
            tech_stack: req.tech_stack,
        })
        .map(Json)
        .map_err(|e| (status_for_code(e.code()), Json(ErrorBody::new(e.code(), e.to_string()))))
}

#[derive(Deserialize)]
pub struct CreateCandidateRequest {
    pub tenant_id: String,
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub resume_text: Option<String>,
}

pub async fn create_candidate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCandidateRequest>,
) -> Result<Json<Candidate>, ApiError> {
    state
        .directory
        .create_candidate(NewCandidate {
            tenant_id: req.tenant_id,
            display_name: req.display_name,
            email: req.email,
            resume_text: req.resume_text,
        })
        .map(Json)
        .map_err(|e| (status_for_code(e.code()), Json(ErrorBody::new(e.code(), e.to_string()))))
}

#[derive(Deserialize)]
pub struct CreateSlotRequest {
    pub job_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub max_candidates: u32,
    #[serde(default)]
    pub recurrence: Option<String>,
}

pub async fn create_slot(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSlotRequest>,
) -> Result<Json<Slot>, ApiError> {
    state
        .scheduler
        .create_slot(
            req.job_id.into(),
            req.date,
            req.start_time,
            req.end_time,
            req.max_candidates,
            req.recurrence,
        )
        .map(Json)
        .map_err(|e| (status_for_code(e.code()), Json(ErrorBody::new(e.code(), e.to_string()))))
}

#[derive(Deserialize)]
pub struct CreateInterviewRequest {
    pub candidate_id: String,
    pub job_id: String,
    #[serde(default = "default_round")]
    pub round_label: String,
}

fn default_round() -> String {
    "round-1".to_string()
}

pub async fn create_interview(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateInterviewRequest>,
) -> Result<Json<Interview>, ApiError> {
    state
        .scheduler
        .create_interview(req.candidate_id.into(), req.job_id.into(), &req.round_label)
        .map(Json)
        .map_err(|e| (status_for_code(e.code()), Json(ErrorBody::new(e.code(), e.to_string()))))
}

pub async fn get_interview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let interview = state
        .scheduler
        .get_interview(&id)
        .map_err(|e| (status_for_code(e.code()), Json(ErrorBody::new(e.code(), e.to_string()))))?;

    let session_summary = state
        .sessions
        .ensure_session(&id)
        .ok()
        .map(|s| {
            json!({
                "session_id": s.id.as_str(),
                "status": s.status.as_str(),
                "id_verification_status": s.id_verification_status.as_str(),
                "is_evaluated": s.is_evaluated,
            })
        });

    Ok(Json(json!({
        "interview": interview,
        "session": session_summary,
    })))
}

#[derive(Deserialize)]
pub struct BookRequest {
    pub slot_id: String,
}

#[derive(Serialize)]
pub struct BookResponse {
    pub schedule: ai_scheduler::BookingSchedule,
    pub booking_ok_email_failed: bool,
}

/// POST /interviews/{id}/book — books the slot, ensures the candidate's
/// Session row exists so a `session_key` is available, and enqueues the
/// scheduled-interview notification (§4.8). Email failure is logged and
/// reported via `booking_ok_email_failed`, never fails the booking.
pub async fn book_interview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<BookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let (schedule, _token) = state
        .scheduler
        .book(&id, &req.slot_id)
        .map_err(|e| (status_for_code(e.code()), Json(ErrorBody::new(e.code(), e.to_string()))))?;

    let interview = state
        .scheduler
        .get_interview(&id)
        .map_err(|e| (status_for_code(e.code()), Json(ErrorBody::new(e.code(), e.to_string()))))?;
    let candidate = state
        .directory
        .get_candidate(interview.candidate_id.as_str())
        .map_err(|e| (status_for_code(e.code()), Json(ErrorBody::new(e.code(), e.to_string()))))?;
    let session = state
        .sessions
        .ensure_session(&id)
        .map_err(|e| (status_for_code(e.code()), Json(ErrorBody::new(e.code(), e.to_string()))))?;

    let mut email_failed = false;
    if state.config.link_url_is_publishable() {
        let started_at = interview.started_at.expect("book populates started_at");
        let url = format!("{}/interview/?session_key={}", state.config.base_url, session.session_key.as_str());
        let body = format!("Your interview is scheduled for {}. Join at: {}", format_ist(started_at), url);
        if let Err(e) = state.notifier.send(&candidate.email, "Interview scheduled", &body).await {
            tracing::warn!(error = %e, "failed to send interview-scheduled notification");
            email_failed = true;
        }
    } else {
        tracing::warn!("base_url not publishable; omitting candidate notification link");
        email_failed = true;
    }

    Ok(Json(BookResponse {
        schedule,
        booking_ok_email_failed: email_failed,
    }))
}

#[derive(Deserialize)]
pub struct RescheduleRequest {
    pub new_slot_id: String,
}

#[derive(Serialize)]
pub struct RescheduleResponse {
    pub schedule: ai_scheduler::BookingSchedule,
    pub new_token: String,
}

pub async fn reschedule_interview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<RescheduleRequest>,
) -> Result<Json<RescheduleResponse>, ApiError> {
    let (schedule, minted) = state
        .scheduler
        .reschedule(&id, &req.new_slot_id)
        .map_err(|e| (status_for_code(e.code()), Json(ErrorBody::new(e.code(), e.to_string()))))?;

    Ok(Json(RescheduleResponse {
        schedule,
        new_token: minted.token,
    }))
}

pub async fn cancel_interview(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let interview = state
        .scheduler
        .get_interview(&id)
        .map_err(|e| (status_for_code(e.code()), Json(ErrorBody::new(e.code(), e.to_string()))))?;

    let Some(schedule_id) = interview.schedule_id else {
        return Ok(Json(json!({ "released": false })));
    };
    state
        .scheduler
        .release(schedule_id.as_str())
        .map_err(|e| (status_for_code(e.code()), Json(ErrorBody::new(e.code(), e.to_string()))))?;

    Ok(Json(json!({ "released": true, "slot_id": schedule_id.as_str() })))
}

pub async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<EvaluationResult>, ApiError> {
    match state.evaluation.get_result(&id) {
        Ok(Some(result)) => Ok(Json(result)),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(ErrorBody::new("EVALUATION_RESULT_NOT_FOUND", "no evaluation result for this session")),
        )),
        Err(e) => Err((status_for_code(e.code()), Json(ErrorBody::new(e.code(), e.to_string())))),
    }
}

/// GET /sessions/{id}/proctor/health — per-detector health for the
/// session's Monitor (SPEC_FULL.md §4.4), one `{detector, status,
/// last_run_at}` entry per detector that has run at least once.
pub async fn get_proctor_health(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<Vec<ai_proctor::DetectorHealthEntry>> {
    Json(state.proctor.health_snapshot(&id))
}
