//! `AiGateway`: the single entry point C5 exposes to the rest of the
//! workspace (§4.5, §9 "one capability surface, no runtime type switching").
//! Owns rate limiting, quota state, and the retry policy; every public
//! method degrades to a deterministic fallback instead of propagating a
//! provider error, unless `ai_quota_hard_fail` is set.

use std::time::Duration;

use ai_directory::types::CodingLanguage;
use tracing::{instrument, warn};

use crate::capability::{
    is_retriable, AnswersEvaluation, AsrCapability, GeneratedQuestion, LlmCapability, OcrResult,
    OverallEvaluation, QuestionGenerationInput, ResumeEvaluation, TtsCapability,
};
use crate::error::{GatewayError, Result};
use crate::followup;
use crate::parse;
use crate::quota::QuotaState;
use crate::ratelimit::RateLimiter;

/// Retry schedule for transient `Network` errors (§4.5: "retried up to 2
/// times with exponential backoff"). Auth and Quota errors are never retried.
const RETRY_BACKOFFS: [Duration; 2] = [Duration::from_millis(500), Duration::from_millis(1500)];

pub struct AiGateway {
    llm: Box<dyn LlmCapability>,
    asr: Box<dyn AsrCapability>,
    tts: Box<dyn TtsCapability>,
    rate_limiter: RateLimiter,
    quota: QuotaState,
    hard_fail_on_quota: bool,
}

impl AiGateway {
    pub fn new(
        llm: Box<dyn LlmCapability>,
        asr: Box<dyn AsrCapability>,
        tts: Box<dyn TtsCapability>,
        max_per_minute: u32,
        hard_fail_on_quota: bool,
    ) -> Self {
        Self {
            llm,
            asr,
            tts,
            rate_limiter: RateLimiter::new(max_per_minute),
            quota: QuotaState::new(),
            hard_fail_on_quota,
        }
    }

    pub fn quota_state(&self) -> QuotaState {
        self.quota.clone()
    }

    /// Runs `op` after acquiring a rate-limit slot, retrying `Network` errors
    /// per [`RETRY_BACKOFFS`] and latching [`QuotaState`] on a `Quota` error.
    async fn call<T, F, Fut>(&self, op_name: &'static str, op: F) -> std::result::Result<T, crate::error::ProviderError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, crate::error::ProviderError>>,
    {
        self.rate_limiter.acquire().await;

        let mut attempt = 0usize;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if matches!(err, crate::error::ProviderError::Quota(_)) => {
                    warn!(op = op_name, "AI provider reports quota exhaustion");
                    self.quota.set_exhausted();
                    return Err(err);
                }
                Err(err) if is_retriable(&err) && attempt < RETRY_BACKOFFS.len() => {
                    warn!(op = op_name, attempt, %err, "retrying transient AI provider error");
                    tokio::time::sleep(RETRY_BACKOFFS[attempt]).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// `generate_questions(job, candidate) → [Question]` (§4.5). Falls back
    /// to the deterministic set on quota exhaustion or unparseable output.
    #[instrument(skip(self, input))]
    pub async fn generate_questions(&self, input: QuestionGenerationInput) -> Result<Vec<GeneratedQuestion>> {
        if self.quota.is_exhausted() {
            return self.fallback_or_hard_fail(|| parse::fallback_questions(&input.candidate_name, input.coding_language));
        }

        match self.call("generate_questions", || self.llm.generate_questions(&input)).await {
            Ok(questions) => Ok(questions),
            Err(crate::error::ProviderError::Quota(_)) => {
                self.fallback_or_hard_fail(|| parse::fallback_questions(&input.candidate_name, input.coding_language))
            }
            Err(err) => Err(GatewayError::Provider(err)),
        }
    }

    /// Parses a raw question sheet (as a live LLM would return it), falling
    /// back to the deterministic set when the sheet doesn't parse (§4.5).
    pub fn parse_or_fallback(&self, markdown: &str, candidate_name: &str, coding_language: CodingLanguage) -> Vec<GeneratedQuestion> {
        parse::parse_question_sheet(markdown, coding_language)
            .unwrap_or_else(|| parse::fallback_questions(candidate_name, coding_language))
    }

    /// `generate_follow_up(question, transcript) → Option<Question>` (§4.5).
    /// Quota exhaustion degrades to "no follow-up" rather than an error —
    /// a follow-up is optional, never a blocking step.
    #[instrument(skip(self, parent_question_text, transcript))]
    pub async fn generate_follow_up(&self, parent_question_text: &str, transcript: &str) -> Result<Option<String>> {
        if !followup::should_request_follow_up(transcript) {
            return Ok(None);
        }
        if self.quota.is_exhausted() {
            if self.hard_fail_on_quota {
                return Err(GatewayError::HardFailQuotaExhausted);
            }
            return Ok(None);
        }

        let raw = self
            .call("generate_follow_up", || self.llm.generate_follow_up(parent_question_text, transcript))
            .await;
        match raw {
            Ok(text) => Ok(followup::normalize_follow_up(text)),
            Err(crate::error::ProviderError::Quota(_)) => Ok(None),
            Err(err) => Err(GatewayError::Provider(err)),
        }
    }

    /// `transcribe(audio) → text` (§4.5). ASR degrades independently of the
    /// LLM quota flag — an empty transcript on failure, never an error.
    #[instrument(skip(self, audio_bytes))]
    pub async fn transcribe(&self, audio_bytes: &[u8], mime: &str) -> String {
        self.rate_limiter.acquire().await;
        match self.asr.transcribe(audio_bytes, mime).await {
            Ok(text) => text,
            Err(err) => {
                warn!(%err, "ASR transcription failed, recording empty transcript");
                String::new()
            }
        }
    }

    /// `synthesize(text) → audio_ref` (§4.5). Returns `None` on failure so
    /// the caller can mark the question's audio as unavailable instead of
    /// failing the whole operation.
    #[instrument(skip(self, text))]
    pub async fn synthesize(&self, text: &str, lang: &str, accent: &str) -> Option<Vec<u8>> {
        self.rate_limiter.acquire().await;
        match self.tts.synthesize(text, lang, accent).await {
            Ok(audio) => Some(audio),
            Err(err) => {
                warn!(%err, "TTS synthesis failed, question audio unavailable");
                None
            }
        }
    }

    /// `evaluate_resume(resume, jd) → score` (§4.5). Fallback: neutral
    /// 7.0/10 score with zero confidence, per the quota-exhaustion rule.
    #[instrument(skip(self, resume_text, jd_text))]
    pub async fn evaluate_resume(&self, resume_text: &str, jd_text: &str) -> Result<ResumeEvaluation> {
        if self.quota.is_exhausted() {
            return self.fallback_or_hard_fail(neutral_resume_evaluation);
        }
        match self.call("evaluate_resume", || self.llm.evaluate_resume(resume_text, jd_text)).await {
            Ok(eval) => Ok(eval),
            Err(crate::error::ProviderError::Quota(_)) => self.fallback_or_hard_fail(neutral_resume_evaluation),
            Err(err) => Err(GatewayError::Provider(err)),
        }
    }

    #[instrument(skip(self, qa_text, code_text))]
    pub async fn evaluate_answers(&self, qa_text: &str, code_text: &str) -> Result<AnswersEvaluation> {
        if self.quota.is_exhausted() {
            return self.fallback_or_hard_fail(neutral_answers_evaluation);
        }
        match self.call("evaluate_answers", || self.llm.evaluate_answers(qa_text, code_text)).await {
            Ok(eval) => Ok(eval),
            Err(crate::error::ProviderError::Quota(_)) => self.fallback_or_hard_fail(neutral_answers_evaluation),
            Err(err) => Err(GatewayError::Provider(err)),
        }
    }

    #[instrument(skip(self, warning_summary))]
    pub async fn evaluate_overall(
        &self,
        resume_score: f64,
        answers_score: f64,
        warning_summary: &str,
    ) -> Result<OverallEvaluation> {
        if self.quota.is_exhausted() {
            return self.fallback_or_hard_fail(|| neutral_overall_evaluation(resume_score, answers_score));
        }
        match self
            .call("evaluate_overall", || self.llm.evaluate_overall(resume_score, answers_score, warning_summary))
            .await
        {
            Ok(eval) => Ok(eval),
            Err(crate::error::ProviderError::Quota(_)) => {
                self.fallback_or_hard_fail(|| neutral_overall_evaluation(resume_score, answers_score))
            }
            Err(err) => Err(GatewayError::Provider(err)),
        }
    }

    /// `ocr_id_card(image) → OcrResult` (§4.5, proctoring). No fallback
    /// content makes sense for OCR, so quota exhaustion is always a hard
    /// error here regardless of `hard_fail_on_quota`.
    #[instrument(skip(self, image_bytes))]
    pub async fn ocr_id_card(&self, image_bytes: &[u8]) -> Result<OcrResult> {
        self.call("ocr_id_card", || self.llm.ocr_id_card(image_bytes))
            .await
            .map_err(GatewayError::Provider)
    }

    fn fallback_or_hard_fail<T>(&self, make_fallback: impl FnOnce() -> T) -> Result<T> {
        if self.hard_fail_on_quota {
            Err(GatewayError::HardFailQuotaExhausted)
        } else {
            Ok(make_fallback())
        }
    }
}

/// Neutral fallback scores (§4.5, §9): 7.0/10 with `confidence_level = 0`
/// signaled via the feedback text rather than a separate field, since the
/// caller (`ai-evaluation`) is what persists `confidence_level` on the row.
fn neutral_resume_evaluation() -> ResumeEvaluation {
    ResumeEvaluation {
        score: 7.0,
        feedback: "AI evaluation unavailable; neutral fallback score applied.".to_string(),
    }
}

fn neutral_answers_evaluation() -> AnswersEvaluation {
    AnswersEvaluation {
        score: 7.0,
        feedback: "AI evaluation unavailable; neutral fallback score applied.".to_string(),
    }
}

fn neutral_overall_evaluation(resume_score: f64, answers_score: f64) -> OverallEvaluation {
    OverallEvaluation {
        score: (resume_score + answers_score) / 2.0,
        recommendation_text: "AI evaluation unavailable; neutral fallback score applied.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeAsr, FakeLlm, FakeTts};

    fn gateway(hard_fail: bool) -> AiGateway {
        AiGateway::new(Box::new(FakeLlm::new()), Box::new(FakeAsr), Box::new(FakeTts), 10, hard_fail)
    }

    fn input() -> QuestionGenerationInput {
        QuestionGenerationInput {
            candidate_name: "Ada".to_string(),
            job_description: "Backend role".to_string(),
            resume_text: "Years of Python".to_string(),
            coding_language: CodingLanguage::Python,
        }
    }

    #[tokio::test]
    async fn generate_questions_succeeds_with_healthy_provider() {
        let gw = gateway(false);
        let questions = gw.generate_questions(input()).await.unwrap();
        assert_eq!(questions.len(), 5);
    }

    #[tokio::test]
    async fn quota_exhaustion_falls_back_to_neutral_scores() {
        let llm = FakeLlm::new();
        llm.fail_next_with(crate::error::ProviderError::Quota("exhausted".to_string()));
        let gw = AiGateway::new(Box::new(llm), Box::new(FakeAsr), Box::new(FakeTts), 10, false);

        let eval = gw.evaluate_resume("resume", "jd").await.unwrap();
        assert_eq!(eval.score, 7.0);
        assert!(gw.quota.is_exhausted());

        let second = gw.evaluate_answers("qa", "code").await.unwrap();
        assert_eq!(second.score, 7.0);
    }

    #[tokio::test]
    async fn hard_fail_mode_returns_error_instead_of_fallback() {
        let llm = FakeLlm::new();
        llm.fail_next_with(crate::error::ProviderError::Quota("exhausted".to_string()));
        let gw = AiGateway::new(Box::new(llm), Box::new(FakeAsr), Box::new(FakeTts), 10, true);

        let err = gw.evaluate_resume("resume", "jd").await.unwrap_err();
        assert_eq!(err.code(), "QUOTA_EXHAUSTED_HARD_FAIL");
    }

    #[tokio::test]
    async fn follow_up_skipped_for_confident_answer() {
        let gw = gateway(false);
        let followup = gw
            .generate_follow_up("What is Rust ownership?", "I have five years of hands-on experience with it")
            .await
            .unwrap();
        assert_eq!(followup, None);
    }

    #[tokio::test]
    async fn follow_up_requested_for_uncertain_answer() {
        let gw = gateway(false);
        let followup = gw
            .generate_follow_up("What is Rust ownership?", "Honestly I'm not sure I fully understand it")
            .await
            .unwrap();
        assert!(followup.is_some());
    }

    #[tokio::test]
    async fn asr_failure_degrades_to_empty_transcript() {
        let gw = gateway(false);
        let text = gw.transcribe(&[], "audio/wav").await;
        assert_eq!(text, "");
    }
}
