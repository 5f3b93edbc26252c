use ai_core::ids::{EvaluationResultId, InterviewId, SessionId};
use serde::{Deserialize, Serialize};

/// Mechanical metrics derived from transcripts (§4.7 item 7): stored
/// alongside the LLM scores, never substituted for them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MechanicalMetrics {
    pub total_filler_words: u32,
    pub average_words_per_minute: f64,
    pub average_response_seconds: f64,
    pub average_sentiment: f64,
}

/// One persisted evaluation. Re-evaluation of a COMPLETED session replaces
/// the prior row atomically (§4.7 "Idempotence").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub id: EvaluationResultId,
    pub session_id: SessionId,
    pub interview_id: InterviewId,
    pub overall_score: f64,
    pub resume_fit_score: f64,
    pub answers_score: f64,
    pub technical_score: Option<f64>,
    pub behavioral_score: Option<f64>,
    pub coding_score: Option<f64>,
    pub resume_feedback: String,
    pub answers_feedback: String,
    pub recommendation_text: String,
    pub hire_recommendation: Option<bool>,
    pub confidence_level: f64,
    pub mechanical_metrics: MechanicalMetrics,
    pub created_at: String,
}

impl EvaluationResult {
    /// §4.7 scale note: LLM sub-scores are canonical 0–10; a 0–100 view is
    /// derived, never persisted as a second source of truth.
    pub fn overall_score_out_of_100(&self) -> f64 {
        self.overall_score * 10.0
    }
}
