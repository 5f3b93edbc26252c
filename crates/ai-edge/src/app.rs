//! Shared application state and router assembly, grounded on
//! `skynet-gateway::app::{AppState, build_router}`: one struct aggregating
//! every manager handle, one `Router::new().route(...).with_state(state)`.

use std::sync::Arc;

use ai_directory::Directory;
use ai_evaluation::EvaluationManager;
use ai_gateway::AiGateway;
use ai_proctor::ProctorRegistry;
use ai_scheduler::SchedulerManager;
use ai_sessions::SessionManager;
use ai_token::TokenService;
use axum::{
    routing::{get, post},
    Router,
};

use crate::notify::NotificationSink;

pub struct AppState {
    pub config: ai_core::config::Config,
    pub directory: Arc<Directory>,
    pub tokens: Arc<TokenService>,
    pub scheduler: Arc<SchedulerManager>,
    pub sessions: Arc<SessionManager>,
    pub proctor: Arc<ProctorRegistry>,
    pub gateway: Arc<AiGateway>,
    pub evaluation: Arc<EvaluationManager>,
    pub notifier: Arc<dyn NotificationSink>,
}

/// Assemble the full Axum router (§6: recruiter API + public candidate
/// endpoints), mirroring `skynet-gateway::app::build_router`'s one-chain
/// `Router::new().route(...).with_state(state).layer(TraceLayer)` shape.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/jobs", post(crate::http::recruiter::create_job))
        .route("/candidates", post(crate::http::recruiter::create_candidate))
        .route("/slots", post(crate::http::recruiter::create_slot))
        .route("/interviews", post(crate::http::recruiter::create_interview))
        .route("/interviews/{id}", get(crate::http::recruiter::get_interview))
        .route("/interviews/{id}/book", post(crate::http::recruiter::book_interview))
        .route(
            "/interviews/{id}/reschedule",
            post(crate::http::recruiter::reschedule_interview),
        )
        .route("/interviews/{id}/cancel", post(crate::http::recruiter::cancel_interview))
        .route("/sessions/{id}/result", get(crate::http::recruiter::get_result))
        .route("/sessions/{id}/proctor/health", get(crate::http::recruiter::get_proctor_health))
        .route("/public/ai-interview/start", post(crate::http::public::start))
        .route(
            "/public/ai-interview/submit-response",
            post(crate::http::public::submit_response),
        )
        .route("/public/ai-interview/complete", post(crate::http::public::complete))
        .route("/public/ai-interview/verify-id", post(crate::http::public::verify_id))
        .route("/public/interview/", get(crate::http::public::portal_entry))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::cors::CorsLayer::permissive())
}

/// End-to-end scenario tests (§8 S4–S6) driving the real manager stack
/// in-process through the HTTP handlers, against in-memory SQLite and the
/// fake AI Gateway — same shape as the manager-level scenario tests in
/// `ai-scheduler`/`ai-evaluation`, one level up at the edge.
#[cfg(test)]
mod tests {
    use super::*;

    use ai_coderunner::{CodeRunner, TestCase};
    use ai_core::ids::TestCaseId;
    use ai_directory::types::{CodingLanguage, NewCandidate, NewJob};
    use ai_gateway::fake::{FakeAsr, FakeLlm, FakeTts};
    use ai_gateway::error::ProviderError;
    use ai_proctor::evidence::LoggingEvidenceSink;
    use ai_token::GraceWindow;
    use axum::extract::{Json as JsonExtract, Path, State};
    use chrono::{NaiveDate, NaiveTime};
    use rusqlite::Connection;

    use crate::http::public::{
        CompleteRequest, StartRequest, SubmitPayloadWire, SubmitResponseRequest, VerifyIdRequest,
    };
    use crate::http::recruiter::{BookRequest, CreateInterviewRequest};
    use crate::notify::LogNotificationSink;

    fn test_state(llm: FakeLlm) -> Arc<AppState> {
        let directory = Arc::new(Directory::new(Connection::open_in_memory().unwrap()).unwrap());
        let tokens = Arc::new(TokenService::new(b"test-secret".to_vec(), GraceWindow::default()));
        let tz: chrono_tz::Tz = "Asia/Kolkata".parse().unwrap();
        let scheduler = Arc::new(
            SchedulerManager::new(Connection::open_in_memory().unwrap(), directory.clone(), tokens.clone(), tz, 7200).unwrap(),
        );
        let gateway = Arc::new(AiGateway::new(Box::new(llm), Box::new(FakeAsr), Box::new(FakeTts), 60, false));
        let coderunner = Arc::new(CodeRunner::new(15));
        let sessions = Arc::new(
            SessionManager::new(
                Connection::open_in_memory().unwrap(),
                directory.clone(),
                scheduler.clone(),
                tokens.clone(),
                gateway.clone(),
                coderunner,
                600,
            )
            .unwrap(),
        );
        let proctor = Arc::new(ProctorRegistry::new(Connection::open_in_memory().unwrap(), Arc::new(LoggingEvidenceSink)).unwrap());
        let evaluation = Arc::new(EvaluationManager::new(
            Connection::open_in_memory().unwrap(),
            sessions.clone(),
            proctor.clone(),
            gateway.clone(),
        ).unwrap());

        Arc::new(AppState {
            config: ai_core::config::Config::default(),
            directory,
            tokens,
            scheduler,
            sessions,
            proctor,
            gateway,
            evaluation,
            notifier: Arc::new(LogNotificationSink),
        })
    }

    /// Books a fresh candidate/job/slot/interview and returns
    /// `(state, interview_id, link_token)`, mirroring what `book_interview`
    /// + an emailed link would hand the candidate.
    async fn book_fresh_interview(state: &Arc<AppState>, coding_language: CodingLanguage) -> (String, String) {
        let job = state
            .directory
            .create_job(NewJob {
                tenant_id: "t1".into(),
                title: "Backend Engineer".into(),
                company: "Acme".into(),
                domain: "fintech".into(),
                coding_language,
                description: "Build reliable backend services.".into(),
                tech_stack: vec!["rust".into()],
            })
            .unwrap();
        let candidate = state
            .directory
            .create_candidate(NewCandidate {
                tenant_id: "t1".into(),
                display_name: "Jane Candidate".into(),
                email: "jane@example.com".into(),
                resume_text: Some("Five years of backend experience.".into()),
            })
            .unwrap();
        let slot = state
            .scheduler
            .create_slot(
                job.id.clone(),
                NaiveDate::from_ymd_opt(2025, 6, 15).unwrap(),
                NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
                1,
                None,
            )
            .unwrap();

        let interview = crate::http::recruiter::create_interview(
            State(state.clone()),
            JsonExtract(CreateInterviewRequest {
                candidate_id: candidate.id.to_string(),
                job_id: job.id.to_string(),
                round_label: "round-1".to_string(),
            }),
        )
        .await
        .unwrap()
        .0;

        crate::http::recruiter::book_interview(
            State(state.clone()),
            Path(interview.id.to_string()),
            JsonExtract(BookRequest { slot_id: slot.id.to_string() }),
        )
        .await
        .unwrap();

        let booked = state.scheduler.get_interview(interview.id.as_str()).unwrap();
        let snapshot = ai_token::InterviewSnapshot {
            interview_id: booked.id.to_string(),
            candidate_email: "jane@example.com".to_string(),
            started_at: booked.started_at.unwrap(),
            ended_at: booked.ended_at.unwrap(),
        };
        let token = state.tokens.mint(&snapshot).token;
        (booked.id.to_string(), token)
    }

    #[tokio::test]
    async fn scenario_s4_session_happy_path_with_passing_code_submission() {
        let state = test_state(FakeLlm::new());
        let (interview_id, token) = book_fresh_interview(&state, CodingLanguage::Python).await;

        let started = crate::http::public::start(
            State(state.clone()),
            JsonExtract(StartRequest {
                interview_id: interview_id.clone(),
                link_token: token.clone(),
            }),
        )
        .await
        .unwrap()
        .0;
        assert_eq!(started.questions.len(), 5);

        // ID verification must succeed before any response can be submitted.
        crate::http::public::verify_id(
            State(state.clone()),
            JsonExtract(VerifyIdRequest {
                session_id: started.session_id.clone(),
                link_token: token.clone(),
                face_count: 2,
                image_base64: base64::engine::general_purpose::STANDARD.encode(b"id-card-frame"),
            }),
        )
        .await
        .unwrap();

        let coding_question = started
            .questions
            .iter()
            .find(|q| q.coding_language.is_some())
            .expect("fallback set always includes a coding question")
            .clone();
        state
            .sessions
            .register_test_case(TestCase {
                id: TestCaseId::from("tc-1"),
                question_id: coding_question.id.clone(),
                input: "\"hello\"".to_string(),
                expected_output: "olleh".to_string(),
                is_hidden: false,
            })
            .unwrap();

        let mut follow_up_seen = false;
        for question in &started.questions {
            let payload = if question.id.as_str() == coding_question.id.as_str() {
                SubmitPayloadWire::Code {
                    source: "def solve(s):\n    return s[::-1]".to_string(),
                    language: CodingLanguage::Python,
                }
            } else if question.text.contains("learn a new technology") {
                SubmitPayloadWire::Text {
                    text: "I am not sure about that, only basic knowledge.".to_string(),
                }
            } else {
                SubmitPayloadWire::Text {
                    text: "Hi, I'm tested and ready to go.".to_string(),
                }
            };

            let outcome = crate::http::public::submit_response(
                State(state.clone()),
                JsonExtract(SubmitResponseRequest {
                    session_id: started.session_id.clone(),
                    link_token: token.clone(),
                    question_id: question.id.to_string(),
                    payload,
                }),
            )
            .await
            .unwrap()
            .0;
            if outcome.follow_up.is_some() {
                follow_up_seen = true;
                let fu = outcome.follow_up.unwrap();
                crate::http::public::submit_response(
                    State(state.clone()),
                    JsonExtract(SubmitResponseRequest {
                        session_id: started.session_id.clone(),
                        link_token: token.clone(),
                        question_id: fu.id.to_string(),
                        payload: SubmitPayloadWire::Text {
                            text: "To be concrete, I once shipped a retry queue with backoff.".to_string(),
                        },
                    }),
                )
                .await
                .unwrap();
            }
        }
        assert!(follow_up_seen, "an uncertain answer should have produced a follow-up");

        // The final `submit_response` above already drove the session to
        // COMPLETED (the last pending question closes it), so the explicit
        // `complete` call here is racing an already-terminal session — accept
        // either outcome and, if it lost the race, run evaluation the way the
        // handler would have.
        match crate::http::public::complete(
            State(state.clone()),
            JsonExtract(CompleteRequest {
                session_id: started.session_id.clone(),
                link_token: token.clone(),
            }),
        )
        .await
        {
            Ok(completed) => assert_eq!(completed.0["status"], "completed"),
            Err((_, body)) => {
                assert_eq!(body.0.code, "SESSION_TERMINAL");
                state.evaluation.evaluate(&started.session_id, &interview_id).await.unwrap();
            }
        }

        let session = state.sessions.get_session(&started.session_id).unwrap();
        assert_eq!(session.status, ai_sessions::SessionStatus::Completed);

        let submissions = state.sessions.list_code_submissions(&started.session_id).unwrap();
        assert_eq!(submissions.len(), 1);
        assert!(submissions[0].passed_all_tests);

        let result = state.evaluation.get_result(&started.session_id).unwrap().unwrap();
        assert!(result.overall_score > 0.0);
    }

    #[tokio::test]
    async fn scenario_s5_quota_exhaustion_falls_back_gracefully() {
        let llm = FakeLlm::new();
        llm.fail_next_with(ProviderError::Quota("quota exceeded".to_string()));
        let state = test_state(llm);
        let (interview_id, token) = book_fresh_interview(&state, CodingLanguage::Python).await;
        let interview_id_for_eval = interview_id.clone();

        let started = crate::http::public::start(
            State(state.clone()),
            JsonExtract(StartRequest { interview_id, link_token: token.clone() }),
        )
        .await
        .unwrap()
        .0;

        assert!(started.degraded);
        assert!(started.questions.iter().any(|q| q.question_type.as_str() == "ICE_BREAKER"));
        assert!(started.questions.iter().any(|q| q.question_type.as_str() == "TECHNICAL"));
        assert!(started.questions.iter().any(|q| q.question_type.as_str() == "BEHAVIORAL"));
        let coding = started
            .questions
            .iter()
            .find(|q| q.question_type.as_str() == "CODING")
            .expect("fallback always includes a coding question");
        assert_eq!(coding.coding_language, Some(CodingLanguage::Python));

        crate::http::public::verify_id(
            State(state.clone()),
            JsonExtract(VerifyIdRequest {
                session_id: started.session_id.clone(),
                link_token: token.clone(),
                face_count: 2,
                image_base64: base64::engine::general_purpose::STANDARD.encode(b"frame"),
            }),
        )
        .await
        .unwrap();

        for question in &started.questions {
            if question.id.as_str() == coding.id.as_str() {
                continue;
            }
            crate::http::public::submit_response(
                State(state.clone()),
                JsonExtract(SubmitResponseRequest {
                    session_id: started.session_id.clone(),
                    link_token: token.clone(),
                    question_id: question.id.to_string(),
                    payload: SubmitPayloadWire::Text { text: "A confident, concrete answer.".to_string() },
                }),
            )
            .await
            .unwrap();
        }
        state
            .sessions
            .register_test_case(TestCase {
                id: TestCaseId::from("tc-fallback"),
                question_id: coding.id.clone(),
                input: "3".to_string(),
                expected_output: "9".to_string(),
                is_hidden: false,
            })
            .unwrap();
        crate::http::public::submit_response(
            State(state.clone()),
            JsonExtract(SubmitResponseRequest {
                session_id: started.session_id.clone(),
                link_token: token.clone(),
                question_id: coding.id.to_string(),
                payload: SubmitPayloadWire::Code {
                    source: "def solve(n):\n    return n * n".to_string(),
                    language: CodingLanguage::Python,
                },
            }),
        )
        .await
        .unwrap();

        // Same race as in S4: the coding submission above may have already
        // closed the session out from under this explicit `complete` call.
        match crate::http::public::complete(
            State(state.clone()),
            JsonExtract(CompleteRequest { session_id: started.session_id.clone(), link_token: token.clone() }),
        )
        .await
        {
            Ok(_) => {}
            Err((_, body)) => {
                assert_eq!(body.0.code, "SESSION_TERMINAL");
                state.evaluation.evaluate(&started.session_id, &interview_id_for_eval).await.unwrap();
            }
        }

        let result = state.evaluation.get_result(&started.session_id).unwrap().unwrap();
        assert_eq!(result.resume_fit_score, 7.0);
        assert_eq!(result.answers_score, 7.0);
        assert_eq!(result.confidence_level, 0.0);
    }

    #[tokio::test]
    async fn scenario_s6_id_verification_wrong_face_count_blocks_question_flow() {
        let state = test_state(FakeLlm::new());
        let (interview_id, token) = book_fresh_interview(&state, CodingLanguage::Python).await;

        let started = crate::http::public::start(
            State(state.clone()),
            JsonExtract(StartRequest { interview_id, link_token: token.clone() }),
        )
        .await
        .unwrap()
        .0;

        let verify_err = crate::http::public::verify_id(
            State(state.clone()),
            JsonExtract(VerifyIdRequest {
                session_id: started.session_id.clone(),
                link_token: token.clone(),
                face_count: 1,
                image_base64: base64::engine::general_purpose::STANDARD.encode(b"single-face-frame"),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(verify_err.1.0.code, "WRONG_FACE_COUNT");

        let first_question = &started.questions[0];
        let err = crate::http::public::submit_response(
            State(state.clone()),
            JsonExtract(SubmitResponseRequest {
                session_id: started.session_id.clone(),
                link_token: token.clone(),
                question_id: first_question.id.to_string(),
                payload: SubmitPayloadWire::Text { text: "Hello".to_string() },
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.1.0.code, "ID_VERIFICATION_REQUIRED");
    }
}
