//! `SessionManager` — the candidate-facing state machine C3 exposes (§4.3).
//! Grounded on `skynet-sessions::SessionManager`'s upsert-then-lock shape,
//! generalized to the richer start/submit/complete contract this component
//! needs and to the per-session serialization §5 requires.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use ai_coderunner::CodeRunner;
use ai_directory::Directory;
use ai_gateway::capability::{QuestionCategory, QuestionGenerationInput};
use ai_gateway::AiGateway;
use ai_scheduler::{Interview, SchedulerManager};
use ai_token::{InterviewSnapshot, TokenService};
use chrono::Utc;
use dashmap::DashMap;
use rusqlite::Connection;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, instrument, warn};

use crate::db;
use crate::error::{Result, SessionsError};
use crate::types::{
    CodeSubmission, IdVerificationStatus, ModelConfig, Question, QuestionLevel, QuestionType,
    Response, ResponseKind, Session, SessionStatus, StartOutcome, SubmitOutcome, SubmitPayload,
};

pub struct SessionManager {
    conn: StdMutex<Connection>,
    directory: Arc<Directory>,
    scheduler: Arc<SchedulerManager>,
    tokens: Arc<TokenService>,
    gateway: Arc<AiGateway>,
    coderunner: Arc<CodeRunner>,
    locks: DashMap<String, Arc<AsyncMutex<()>>>,
    idle_timeout: Duration,
}

impl SessionManager {
    pub fn new(
        conn: Connection,
        directory: Arc<Directory>,
        scheduler: Arc<SchedulerManager>,
        tokens: Arc<TokenService>,
        gateway: Arc<AiGateway>,
        coderunner: Arc<CodeRunner>,
        idle_timeout_secs: u64,
    ) -> Result<Self> {
        db::init_db(&conn)?;
        Ok(Self {
            conn: StdMutex::new(conn),
            directory,
            scheduler,
            tokens,
            gateway,
            coderunner,
            locks: DashMap::new(),
            idle_timeout: Duration::from_secs(idle_timeout_secs),
        })
    }

    fn lock_for(&self, session_key: &str) -> Arc<AsyncMutex<()>> {
        self.locks.entry(session_key.to_string()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
    }

    /// Resolves and signature-verifies `token`, returning the `Interview` it
    /// names. Never leaks the specific [`VerifyReason`](ai_token::VerifyReason)
    /// to the caller beyond "invalid" — the reason is only logged (§4.1).
    fn verify_token(&self, token: &str) -> Result<Interview> {
        let interview_id = TokenService::peek_interview_id(token).map_err(|reason| {
            warn!(%reason, "token failed to decode");
            SessionsError::TokenInvalid
        })?;

        let interview = self.scheduler.get_interview(&interview_id).ok();
        let snapshot = match &interview {
            Some(iv) => {
                let candidate = self.directory.get_candidate(iv.candidate_id.as_str())?;
                match (iv.started_at, iv.ended_at) {
                    (Some(started_at), Some(ended_at)) => Some(InterviewSnapshot {
                        interview_id: iv.id.to_string(),
                        candidate_email: candidate.email,
                        started_at,
                        ended_at,
                    }),
                    _ => None,
                }
            }
            None => None,
        };

        let outcome = self.tokens.verify(token, snapshot.as_ref(), Utc::now());
        if !outcome.valid {
            warn!(reason = %outcome.reason, interview_id = %interview_id, "token verification failed");
            return Err(SessionsError::TokenInvalid);
        }

        interview.ok_or(SessionsError::TokenInvalid)
    }

    /// `start(token) → {session_id, questions[], current_question, total}` (§4.3).
    /// Idempotent: concurrent callers within the window converge on one
    /// ACTIVE transition and all receive the same snapshot.
    #[instrument(skip(self, token))]
    pub async fn start(&self, token: &str) -> Result<StartOutcome> {
        let interview = self.verify_token(token)?;
        let interview_key = interview.id.to_string();
        let lock = self.lock_for(&interview_key);
        let _guard = lock.lock().await;

        let existing = {
            let conn = self.conn.lock().expect("sessions connection poisoned");
            db::find_session_by_interview(&conn, interview.id.as_str())?
        };

        let session = match existing {
            Some(session) => session,
            None => self.create_session_row(&interview)?,
        };

        if session.status.is_terminal() {
            return Err(SessionsError::SessionTerminal(session.id.to_string()));
        }

        if session.status != SessionStatus::Scheduled {
            let questions = {
                let conn = self.conn.lock().expect("sessions connection poisoned");
                db::list_questions_for_session(&conn, session.id.as_str())?
            };
            return Ok(StartOutcome {
                session,
                questions,
                degraded: self.gateway.quota_state().is_exhausted(),
            });
        }

        let job = self.directory.get_job(interview.job_id.as_str())?;
        let generated = self
            .gateway
            .generate_questions(QuestionGenerationInput {
                candidate_name: session.candidate_name.clone(),
                job_description: session.job_description_snapshot.clone(),
                resume_text: session.resume_text_snapshot.clone(),
                coding_language: job.coding_language,
            })
            .await?;
        let degraded = self.gateway.quota_state().is_exhausted();

        let now = Utc::now().to_rfc3339();
        let mut questions = Vec::with_capacity(generated.len());
        {
            let conn = self.conn.lock().expect("sessions connection poisoned");
            for (idx, gq) in generated.iter().enumerate() {
                let question = Question {
                    id: ai_core::ids::QuestionId::new(),
                    session_id: session.id.clone(),
                    order: idx as u32,
                    question_type: question_type_from_category(gq.category),
                    level: QuestionLevel::Main,
                    parent_id: None,
                    text: gq.text.clone(),
                    coding_language: gq.coding_language,
                    audio_ref: None,
                    created_at: now.clone(),
                };
                db::insert_question(&conn, &question)?;
                questions.push(question);
            }
            db::update_session_state(
                &conn,
                session.id.as_str(),
                SessionStatus::Active,
                0,
                Some(&now),
                None,
                None,
                &now,
            )?;
        }

        info!(session_id = %session.id, question_count = questions.len(), "session started");

        let mut started = session;
        started.status = SessionStatus::Active;
        started.session_started_at = Some(now);
        started.total_questions = questions.len() as u32;

        Ok(StartOutcome {
            session: started,
            questions,
            degraded,
        })
    }

    fn create_session_row(&self, interview: &Interview) -> Result<Session> {
        let candidate = self.directory.get_candidate(interview.candidate_id.as_str())?;
        let job = self.directory.get_job(interview.job_id.as_str())?;
        let now = Utc::now().to_rfc3339();
        let session = Session {
            id: ai_core::ids::SessionId::new(),
            session_key: ai_core::ids::SessionKey::new(),
            interview_id: interview.id.clone(),
            candidate_name: candidate.display_name,
            candidate_email: candidate.email,
            job_description_snapshot: job.description,
            resume_text_snapshot: candidate.resume_text.unwrap_or_default(),
            coding_language: job.coding_language,
            model_config: ModelConfig::default(),
            status: SessionStatus::Scheduled,
            current_question_index: 0,
            total_questions: 0,
            session_started_at: None,
            session_ended_at: None,
            last_heartbeat_at: None,
            id_verification_status: IdVerificationStatus::Pending,
            id_extracted_name: None,
            id_extracted_number: None,
            error_message: None,
            is_evaluated: false,
            created_at: now.clone(),
            updated_at: now,
        };
        let conn = self.conn.lock().expect("sessions connection poisoned");
        db::insert_session(&conn, &session)?;
        Ok(session)
    }

    /// `submit_response(session_id, token, question_id, payload)` (§4.3).
    #[instrument(skip(self, token, payload))]
    pub async fn submit_response(
        &self,
        session_id: &str,
        token: &str,
        question_id: &str,
        payload: SubmitPayload,
    ) -> Result<SubmitOutcome> {
        let interview = self.verify_token(token)?;
        let lock = self.lock_for(&interview.id.to_string());
        let _guard = lock.lock().await;

        let session = {
            let conn = self.conn.lock().expect("sessions connection poisoned");
            db::get_session(&conn, session_id)?
        };
        if session.interview_id.as_str() != interview.id.as_str() {
            return Err(SessionsError::TokenInvalid);
        }
        if session.status.is_terminal() || session.status != SessionStatus::Active {
            return Err(SessionsError::SessionTerminal(session_id.to_string()));
        }
        if session.id_verification_status != IdVerificationStatus::Verified {
            return Err(SessionsError::IdVerificationRequired(session_id.to_string()));
        }

        let question = {
            let conn = self.conn.lock().expect("sessions connection poisoned");
            db::get_question(&conn, question_id)?
        };

        let existing = {
            let conn = self.conn.lock().expect("sessions connection poisoned");
            db::find_response_for_question(&conn, question_id)?
        };
        if let Some(prior) = &existing {
            if !prior.text.trim().is_empty() {
                return Err(SessionsError::AlreadyAnswered(question_id.to_string()));
            }
        }
        if question.level == QuestionLevel::FollowUp {
            let parent_id = question.parent_id.clone().ok_or_else(|| SessionsError::ParentUnanswered(question_id.to_string()))?;
            let parent_answered = {
                let conn = self.conn.lock().expect("sessions connection poisoned");
                db::find_response_for_question(&conn, parent_id.as_str())?
            };
            if parent_answered.map(|r| r.text.trim().is_empty()).unwrap_or(true) {
                return Err(SessionsError::ParentUnanswered(question_id.to_string()));
            }
        }

        let now = Utc::now().to_rfc3339();
        let (kind, text) = match payload {
            SubmitPayload::Text(text) => (ResponseKind::Text, text),
            SubmitPayload::Audio { bytes, mime } => {
                let transcript = self.gateway.transcribe(&bytes, &mime).await;
                (ResponseKind::Audio, transcript)
            }
            SubmitPayload::Code { source, language } => {
                let test_cases = {
                    let conn = self.conn.lock().expect("sessions connection poisoned");
                    db::list_test_cases_for_question(&conn, question_id)?
                };
                let result = self.coderunner.run_submission(&source, language, test_cases).await?;
                let submission = CodeSubmission {
                    id: ai_core::ids::CodeSubmissionId::new(),
                    session_id: session.id.clone(),
                    question_id: question.id.clone(),
                    language,
                    source: source.clone(),
                    passed_all_tests: result.passed_all_tests,
                    output_log: result.output_log.clone(),
                    created_at: now.clone(),
                };
                let conn = self.conn.lock().expect("sessions connection poisoned");
                db::insert_code_submission(&conn, &submission)?;
                (ResponseKind::Code, result.output_log)
            }
        };

        let response = Response {
            id: ai_core::ids::ResponseId::new(),
            question_id: question.id.clone(),
            session_id: session.id.clone(),
            kind,
            text: text.clone(),
            submitted_at: now.clone(),
            duration_seconds: 0.0,
            metrics: None,
        };
        {
            let conn = self.conn.lock().expect("sessions connection poisoned");
            db::insert_response(&conn, &response)?;
        }

        let mut follow_up = None;
        let degraded_before = self.gateway.quota_state().is_exhausted();
        if question.level == QuestionLevel::Main && !text.trim().is_empty() {
            if let Some(followup_text) = self.gateway.generate_follow_up(&question.text, &text).await? {
                let fu = Question {
                    id: ai_core::ids::QuestionId::new(),
                    session_id: session.id.clone(),
                    order: question.order,
                    question_type: question.question_type,
                    level: QuestionLevel::FollowUp,
                    parent_id: Some(question.id.clone()),
                    text: followup_text,
                    coding_language: None,
                    audio_ref: None,
                    created_at: now.clone(),
                };
                let conn = self.conn.lock().expect("sessions connection poisoned");
                db::insert_question(&conn, &fu)?;
                follow_up = Some(fu);
            }
        }

        let (next_question_id, all_done) = {
            let conn = self.conn.lock().expect("sessions connection poisoned");
            self.next_pending_question(&conn, session.id.as_str())?
        };

        if all_done {
            self.complete_locked(session.id.as_str())?;
        } else if let Some(ref next_id) = next_question_id {
            let conn = self.conn.lock().expect("sessions connection poisoned");
            let idx_questions = db::list_questions_for_session(&conn, session.id.as_str())?;
            if let Some(idx) = idx_questions.iter().position(|q| q.id.as_str() == next_id.as_str()) {
                db::update_session_state(
                    &conn,
                    session.id.as_str(),
                    SessionStatus::Active,
                    idx as u32,
                    session.session_started_at.as_deref(),
                    None,
                    None,
                    &now,
                )?;
            }
        }

        Ok(SubmitOutcome {
            next_question_id,
            follow_up,
            degraded: degraded_before || self.gateway.quota_state().is_exhausted(),
        })
    }

    /// Next MAIN/FOLLOW_UP question without a non-empty Response, in order.
    /// Returns `(None, true)` when every question has been answered.
    fn next_pending_question(&self, conn: &Connection, session_id: &str) -> Result<(Option<ai_core::ids::QuestionId>, bool)> {
        let questions = db::list_questions_for_session(conn, session_id)?;
        for q in &questions {
            let response = db::find_response_for_question(conn, q.id.as_str())?;
            if response.map(|r| r.text.trim().is_empty()).unwrap_or(true) {
                return Ok((Some(q.id.clone()), false));
            }
        }
        Ok((None, true))
    }

    /// `complete(session_id, token)` (§4.3). Transitions the Session to
    /// COMPLETED; the caller (C8) is responsible for invoking the Evaluation
    /// Engine afterward, since that crate depends on this one and not the
    /// reverse.
    #[instrument(skip(self, token))]
    pub async fn complete(&self, session_id: &str, token: &str) -> Result<()> {
        let interview = self.verify_token(token)?;
        let lock = self.lock_for(&interview.id.to_string());
        let _guard = lock.lock().await;

        let session = {
            let conn = self.conn.lock().expect("sessions connection poisoned");
            db::get_session(&conn, session_id)?
        };
        if session.interview_id.as_str() != interview.id.as_str() {
            return Err(SessionsError::TokenInvalid);
        }
        if session.status.is_terminal() {
            return Err(SessionsError::SessionTerminal(session_id.to_string()));
        }
        self.complete_locked(session_id)
    }

    fn complete_locked(&self, session_id: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().expect("sessions connection poisoned");
        let session = db::get_session(&conn, session_id)?;
        db::update_session_state(
            &conn,
            session_id,
            SessionStatus::Completed,
            session.total_questions,
            session.session_started_at.as_deref(),
            Some(&now),
            None,
            &now,
        )?;
        info!(session_id, "session completed");
        Ok(())
    }

    /// `heartbeat(session_id)` (§4.3): refreshes liveness only; expiry is
    /// decided by [`sweep_expired`](Self::sweep_expired).
    #[instrument(skip(self))]
    pub fn heartbeat(&self, session_id: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().expect("sessions connection poisoned");
        db::get_session(&conn, session_id)?;
        db::touch_heartbeat(&conn, session_id, &now)
    }

    /// Marks ACTIVE sessions EXPIRED once idle beyond `idle_timeout` *and*
    /// the bound interview's scheduled window has also passed (§4.3).
    #[instrument(skip(self))]
    pub fn sweep_expired(&self) -> Result<Vec<String>> {
        let now = Utc::now();
        let sessions = {
            let conn = self.conn.lock().expect("sessions connection poisoned");
            db::list_active_sessions(&conn)?
        };

        let mut expired = Vec::new();
        for session in sessions {
            let Ok(interview) = self.scheduler.get_interview(session.interview_id.as_str()) else {
                continue;
            };
            let Some(link_expires_at) = interview.link_expires_at else {
                continue;
            };
            if now <= link_expires_at {
                continue;
            }
            let idle_too_long = match &session.last_heartbeat_at {
                Some(last) => last
                    .parse::<chrono::DateTime<Utc>>()
                    .map(|last_dt| now.signed_duration_since(last_dt).num_seconds().max(0) as u64 > self.idle_timeout.as_secs())
                    .unwrap_or(true),
                None => true,
            };
            if !idle_too_long {
                continue;
            }

            let now_str = now.to_rfc3339();
            let conn = self.conn.lock().expect("sessions connection poisoned");
            db::update_session_state(
                &conn,
                session.id.as_str(),
                SessionStatus::Expired,
                session.current_question_index,
                session.session_started_at.as_deref(),
                Some(&now_str),
                None,
                &now_str,
            )?;
            warn!(session_id = %session.id, "session expired by sweeper");
            expired.push(session.id.to_string());
        }
        Ok(expired)
    }

    /// ID verification one-shot (§4.4), invoked before ACTIVE question flow
    /// begins. Lives here (not in `ai-proctor`) because it mutates the
    /// Session row that this crate owns exclusively.
    #[instrument(skip(self, face_count, id_image_bytes))]
    pub async fn verify_id(&self, session_id: &str, face_count: u32, id_image_bytes: &[u8]) -> Result<IdVerificationStatus> {
        if face_count != 2 {
            self.set_id_verification(session_id, IdVerificationStatus::Failed, None, None)?;
            return Err(SessionsError::WrongFaceCount {
                session_id: session_id.to_string(),
                found: face_count,
            });
        }

        let session = {
            let conn = self.conn.lock().expect("sessions connection poisoned");
            db::get_session(&conn, session_id)?
        };
        let ocr = self.gateway.ocr_id_card(id_image_bytes).await?;
        let first_token = session.candidate_name.split_whitespace().next().unwrap_or("").to_lowercase();
        let matches = !first_token.is_empty() && ocr.name.to_lowercase().contains(&first_token);

        let status = if matches { IdVerificationStatus::Verified } else { IdVerificationStatus::Failed };
        self.set_id_verification(session_id, status, Some(&ocr.name), Some(&ocr.id_number))?;
        Ok(status)
    }

    fn set_id_verification(&self, session_id: &str, status: IdVerificationStatus, name: Option<&str>, number: Option<&str>) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().expect("sessions connection poisoned");
        db::update_id_verification(&conn, session_id, status, name, number, &now)
    }

    pub fn get_session(&self, session_id: &str) -> Result<Session> {
        let conn = self.conn.lock().expect("sessions connection poisoned");
        db::get_session(&conn, session_id)
    }

    /// Finds or lazily creates the SCHEDULED `Session` row for `interview_id`,
    /// without advancing it to ACTIVE. The edge calls this right after a
    /// booking so a `session_key` exists for the notification link before
    /// the candidate ever authenticates.
    pub fn ensure_session(&self, interview_id: &str) -> Result<Session> {
        let existing = {
            let conn = self.conn.lock().expect("sessions connection poisoned");
            db::find_session_by_interview(&conn, interview_id)?
        };
        if let Some(session) = existing {
            return Ok(session);
        }
        let interview = self.scheduler.get_interview(interview_id)?;
        self.create_session_row(&interview)
    }

    pub fn list_questions(&self, session_id: &str) -> Result<Vec<Question>> {
        let conn = self.conn.lock().expect("sessions connection poisoned");
        db::list_questions_for_session(&conn, session_id)
    }

    pub fn list_responses(&self, session_id: &str) -> Result<Vec<Response>> {
        let conn = self.conn.lock().expect("sessions connection poisoned");
        db::list_responses_for_session(&conn, session_id)
    }

    pub fn list_code_submissions(&self, session_id: &str) -> Result<Vec<CodeSubmission>> {
        let conn = self.conn.lock().expect("sessions connection poisoned");
        db::list_code_submissions_for_session(&conn, session_id)
    }

    /// Every session currently in COMPLETED status, regardless of whether it
    /// has been evaluated yet — the candidate pool for `reevaluate_pending`.
    pub fn list_completed_sessions(&self) -> Result<Vec<Session>> {
        let conn = self.conn.lock().expect("sessions connection poisoned");
        db::list_completed_sessions(&conn)
    }

    pub fn register_test_case(&self, case: ai_coderunner::TestCase) -> Result<()> {
        let conn = self.conn.lock().expect("sessions connection poisoned");
        db::insert_test_case(&conn, &case)
    }

    pub fn mark_evaluated(&self, session_id: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().expect("sessions connection poisoned");
        db::mark_evaluated(&conn, session_id, &now)
    }
}

fn question_type_from_category(category: QuestionCategory) -> QuestionType {
    match category {
        QuestionCategory::IceBreaker => QuestionType::IceBreaker,
        QuestionCategory::Technical => QuestionType::Technical,
        QuestionCategory::Behavioral => QuestionType::Behavioral,
        QuestionCategory::Coding => QuestionType::Coding,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_directory::types::{CodingLanguage, NewCandidate, NewJob};
    use ai_gateway::fake::{FakeAsr, FakeLlm, FakeTts};
    use ai_token::GraceWindow;
    use chrono::{NaiveDate, NaiveTime};

    const SECRET: &[u8] = b"secret";

    fn setup() -> (SessionManager, Arc<TokenService>, Interview) {
        let directory = Arc::new(Directory::new(Connection::open_in_memory().unwrap()).unwrap());
        let tokens = Arc::new(TokenService::new(SECRET.to_vec(), GraceWindow::default()));
        let tz: chrono_tz::Tz = "Asia/Kolkata".parse().unwrap();
        let scheduler = Arc::new(
            SchedulerManager::new(Connection::open_in_memory().unwrap(), directory.clone(), tokens.clone(), tz, 7200).unwrap(),
        );

        let job = directory
            .create_job(NewJob {
                tenant_id: "t1".into(),
                title: "Backend Engineer".into(),
                company: "Acme".into(),
                domain: "fintech".into(),
                coding_language: CodingLanguage::Python,
                description: "Build things".into(),
                tech_stack: vec![],
            })
            .unwrap();
        let candidate = directory
            .create_candidate(NewCandidate {
                tenant_id: "t1".into(),
                display_name: "Jane Candidate".into(),
                email: "ada@example.com".into(),
                resume_text: Some("Years of experience".into()),
            })
            .unwrap();
        let slot = scheduler
            .create_slot(
                job.id.clone(),
                NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
                1,
                None,
            )
            .unwrap();
        let interview = scheduler.create_interview(candidate.id, job.id, "round-1").unwrap();
        scheduler.book(interview.id.as_str(), slot.id.as_str()).unwrap();
        let booked = scheduler.get_interview(interview.id.as_str()).unwrap();

        let gateway = Arc::new(AiGateway::new(Box::new(FakeLlm::new()), Box::new(FakeAsr), Box::new(FakeTts), 60, false));
        let coderunner = Arc::new(CodeRunner::new(15));
        let mgr = SessionManager::new(
            Connection::open_in_memory().unwrap(),
            directory,
            scheduler,
            tokens.clone(),
            gateway,
            coderunner,
            600,
        )
        .unwrap();

        (mgr, tokens, booked)
    }

    fn token_for(interview: &Interview) -> String {
        let snapshot = InterviewSnapshot {
            interview_id: interview.id.to_string(),
            candidate_email: "ada@example.com".to_string(),
            started_at: interview.started_at.unwrap(),
            ended_at: interview.ended_at.unwrap(),
        };
        TokenService::new(SECRET.to_vec(), GraceWindow::default()).mint(&snapshot).token
    }

    #[tokio::test]
    async fn start_is_idempotent_within_window() {
        let (mgr, _tokens, interview) = setup();
        let token = token_for(&interview);

        let first = mgr.start(&token).await.unwrap();
        assert_eq!(first.questions.len(), 5);
        assert_eq!(first.session.status, SessionStatus::Active);

        let second = mgr.start(&token).await.unwrap();
        assert_eq!(second.session.id, first.session.id);
        assert_eq!(second.questions.len(), first.questions.len());
    }

    #[tokio::test]
    async fn submit_response_rejects_double_answer() {
        let (mgr, _tokens, interview) = setup();
        let token = token_for(&interview);
        let started = mgr.start(&token).await.unwrap();
        mgr.verify_id(started.session.id.as_str(), 2, b"id-card-frame").await.unwrap();
        let first_question = &started.questions[0];

        mgr.submit_response(started.session.id.as_str(), &token, first_question.id.as_str(), SubmitPayload::Text("hello".to_string()))
            .await
            .unwrap();

        let err = mgr
            .submit_response(started.session.id.as_str(), &token, first_question.id.as_str(), SubmitPayload::Text("again".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ALREADY_ANSWERED");
    }

    #[tokio::test]
    async fn submit_response_blocked_until_id_verified() {
        let (mgr, _tokens, interview) = setup();
        let token = token_for(&interview);
        let started = mgr.start(&token).await.unwrap();

        let err = mgr
            .submit_response(started.session.id.as_str(), &token, started.questions[0].id.as_str(), SubmitPayload::Text("too early".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ID_VERIFICATION_REQUIRED");

        let face_err = mgr.verify_id(started.session.id.as_str(), 1, b"single-face-frame").await.unwrap_err();
        assert_eq!(face_err.code(), "WRONG_FACE_COUNT");

        let err2 = mgr
            .submit_response(started.session.id.as_str(), &token, started.questions[0].id.as_str(), SubmitPayload::Text("still too early".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err2.code(), "ID_VERIFICATION_REQUIRED");

        let status2 = mgr.verify_id(started.session.id.as_str(), 2, b"two-face-frame").await.unwrap();
        assert_eq!(status2, IdVerificationStatus::Verified);

        mgr.submit_response(started.session.id.as_str(), &token, started.questions[0].id.as_str(), SubmitPayload::Text("now allowed".to_string()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn submit_response_on_completed_session_is_terminal() {
        let (mgr, _tokens, interview) = setup();
        let token = token_for(&interview);
        let started = mgr.start(&token).await.unwrap();
        mgr.complete(started.session.id.as_str(), &token).await.unwrap();

        let err = mgr
            .submit_response(started.session.id.as_str(), &token, started.questions[0].id.as_str(), SubmitPayload::Text("late".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "SESSION_TERMINAL");
    }

    #[tokio::test]
    async fn heartbeat_then_sweep_leaves_fresh_session_active() {
        let (mgr, _tokens, interview) = setup();
        let token = token_for(&interview);
        let started = mgr.start(&token).await.unwrap();
        mgr.heartbeat(started.session.id.as_str()).unwrap();

        let expired = mgr.sweep_expired().unwrap();
        assert!(expired.is_empty());
    }
}
