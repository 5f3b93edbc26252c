//! The three provider capability surfaces (§4.5, §9 "abstract behind an
//! `AIGateway` capability surface... no runtime type switching"). Each is a
//! plain `async_trait` so a live network implementation and the deterministic
//! fake sit behind the same interface.

use async_trait::async_trait;
use ai_directory::types::CodingLanguage;

use crate::error::{ProviderError, Result as ProviderResult};

/// A single generated interview question, as returned by `generate_questions`
/// before it is persisted as a `Question` row (that type lives in `ai-sessions`
/// — this crate has no knowledge of sessions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedQuestion {
    pub category: QuestionCategory,
    pub text: String,
    /// Set only for `Coding` category questions.
    pub coding_language: Option<CodingLanguage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionCategory {
    IceBreaker,
    Technical,
    Behavioral,
    Coding,
}

/// Inputs `generate_questions` needs — a thin snapshot so this crate never
/// depends on `ai-sessions` (which itself will depend on `ai-gateway`).
#[derive(Debug, Clone)]
pub struct QuestionGenerationInput {
    pub candidate_name: String,
    pub job_description: String,
    pub resume_text: String,
    pub coding_language: CodingLanguage,
}

#[derive(Debug, Clone)]
pub struct ResumeEvaluation {
    pub score: f64,
    pub feedback: String,
}

#[derive(Debug, Clone)]
pub struct AnswersEvaluation {
    pub score: f64,
    pub feedback: String,
}

#[derive(Debug, Clone)]
pub struct OverallEvaluation {
    pub score: f64,
    pub recommendation_text: String,
}

#[derive(Debug, Clone)]
pub struct OcrResult {
    pub name: String,
    pub id_number: String,
}

/// LLM capability surface: question generation, follow-ups, résumé/answer/
/// overall evaluation, and ID-card OCR (§4.5).
#[async_trait]
pub trait LlmCapability: Send + Sync {
    async fn generate_questions(
        &self,
        input: &QuestionGenerationInput,
    ) -> ProviderResult<Vec<GeneratedQuestion>>;

    /// `None` means "no follow-up" — either the sentinel, a short/empty
    /// response, or (at the gateway layer) quota exhaustion.
    async fn generate_follow_up(
        &self,
        parent_question_text: &str,
        transcript: &str,
    ) -> ProviderResult<Option<String>>;

    async fn evaluate_resume(&self, resume_text: &str, jd_text: &str) -> ProviderResult<ResumeEvaluation>;

    async fn evaluate_answers(&self, qa_text: &str, code_text: &str) -> ProviderResult<AnswersEvaluation>;

    async fn evaluate_overall(
        &self,
        resume_score: f64,
        answers_score: f64,
        warning_summary: &str,
    ) -> ProviderResult<OverallEvaluation>;

    async fn ocr_id_card(&self, image_bytes: &[u8]) -> ProviderResult<OcrResult>;
}

/// ASR capability: audio transcription (§4.5). Degrades independently of the
/// LLM capability's quota state.
#[async_trait]
pub trait AsrCapability: Send + Sync {
    async fn transcribe(&self, audio_bytes: &[u8], mime: &str) -> ProviderResult<String>;
}

/// TTS capability: question audio synthesis (§4.5). On failure, callers get
/// an empty blob rather than a propagated error — degradation is recorded by
/// the caller (`ai-sessions`) on the Question, not here.
#[async_trait]
pub trait TtsCapability: Send + Sync {
    async fn synthesize(&self, text: &str, lang: &str, accent: &str) -> ProviderResult<Vec<u8>>;
}

/// Marker so callers can tell a `ProviderError` apart from a transport-level
/// failure they should simply retry. Kept here (rather than in `error.rs`)
/// next to the traits it classifies.
pub fn is_retriable(err: &ProviderError) -> bool {
    matches!(err, ProviderError::Network(_))
}
