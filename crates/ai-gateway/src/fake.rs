//! Deterministic fake capability implementations (§9: "one live
//! implementation plus a deterministic fake for tests"). No network calls
//! are made — see SPEC_FULL.md §4.5 / DESIGN.md for why only the fake ships
//! in this workspace.

use async_trait::async_trait;

use ai_directory::types::CodingLanguage;

use crate::capability::{
    AnswersEvaluation, AsrCapability, GeneratedQuestion, LlmCapability, OcrResult,
    OverallEvaluation, QuestionCategory, QuestionGenerationInput, ResumeEvaluation, TtsCapability,
};
use crate::error::{ProviderError, Result as ProviderResult};
use crate::followup;

/// Renders a Markdown question sheet in the exact shape the real parser
/// expects, so exercising `FakeLlm` through the gateway's parser is a
/// faithful stand-in for a real model response.
pub struct FakeLlm {
    /// When set, `generate_questions` returns this error instead of content —
    /// used to drive quota-exhaustion / retry tests.
    pub next_error: std::sync::Mutex<Option<ProviderError>>,
}

impl FakeLlm {
    pub fn new() -> Self {
        Self {
            next_error: std::sync::Mutex::new(None),
        }
    }

    pub fn fail_next_with(&self, err: ProviderError) {
        *self.next_error.lock().unwrap() = Some(err);
    }

    fn take_error(&self) -> Option<ProviderError> {
        self.next_error.lock().unwrap().take()
    }
}

impl Default for FakeLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmCapability for FakeLlm {
    async fn generate_questions(
        &self,
        input: &QuestionGenerationInput,
    ) -> ProviderResult<Vec<GeneratedQuestion>> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }
        Ok(vec![
            GeneratedQuestion {
                category: QuestionCategory::IceBreaker,
                text: format!("Welcome {}! Tell me about yourself.", input.candidate_name),
                coding_language: None,
            },
            GeneratedQuestion {
                category: QuestionCategory::Technical,
                text: "What is the difference between a stack and a queue?".to_string(),
                coding_language: None,
            },
            GeneratedQuestion {
                category: QuestionCategory::Technical,
                text: "How would you design a rate limiter for an API?".to_string(),
                coding_language: None,
            },
            GeneratedQuestion {
                category: QuestionCategory::Behavioral,
                text: "Describe a time you had to learn a new technology quickly.".to_string(),
                coding_language: None,
            },
            GeneratedQuestion {
                category: QuestionCategory::Coding,
                text: "Write a function `solve` that reverses a given string.".to_string(),
                coding_language: Some(input.coding_language),
            },
        ])
    }

    async fn generate_follow_up(
        &self,
        _parent_question_text: &str,
        transcript: &str,
    ) -> ProviderResult<Option<String>> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }
        if followup::should_request_follow_up(transcript) {
            Ok(Some("Could you walk me through an example of that?".to_string()))
        } else {
            Ok(Some(followup::NO_FOLLOW_UP_SENTINEL.to_string()))
        }
    }

    async fn evaluate_resume(&self, _resume_text: &str, _jd_text: &str) -> ProviderResult<ResumeEvaluation> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }
        Ok(ResumeEvaluation {
            score: 8.0,
            feedback: "Strong alignment with the role's required skills.".to_string(),
        })
    }

    async fn evaluate_answers(&self, _qa_text: &str, _code_text: &str) -> ProviderResult<AnswersEvaluation> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }
        Ok(AnswersEvaluation {
            score: 7.5,
            feedback: "Clear, structured answers with solid technical depth.".to_string(),
        })
    }

    async fn evaluate_overall(
        &self,
        resume_score: f64,
        answers_score: f64,
        _warning_summary: &str,
    ) -> ProviderResult<OverallEvaluation> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }
        let score = (resume_score + answers_score) / 2.0;
        Ok(OverallEvaluation {
            score,
            recommendation_text: if score >= 6.0 {
                "Recommend advancing to the next round.".to_string()
            } else {
                "Recommend against advancing at this time.".to_string()
            },
        })
    }

    async fn ocr_id_card(&self, _image_bytes: &[u8]) -> ProviderResult<OcrResult> {
        if let Some(err) = self.take_error() {
            return Err(err);
        }
        Ok(OcrResult {
            name: "JANE CANDIDATE".to_string(),
            id_number: "ID-0000-0000".to_string(),
        })
    }
}

/// Deterministic ASR fake: returns a fixed transcript derived from the
/// input length so different recordings produce distinguishable output in
/// tests without decoding real audio.
pub struct FakeAsr;

#[async_trait]
impl AsrCapability for FakeAsr {
    async fn transcribe(&self, audio_bytes: &[u8], _mime: &str) -> ProviderResult<String> {
        if audio_bytes.is_empty() {
            return Ok(String::new());
        }
        Ok(String::from_utf8_lossy(audio_bytes).to_string())
    }
}

/// Deterministic TTS fake: "synthesizes" by returning the UTF-8 bytes of the
/// text itself, long enough to exercise audio-ref plumbing without a real
/// codec dependency.
pub struct FakeTts;

#[async_trait]
impl TtsCapability for FakeTts {
    async fn synthesize(&self, text: &str, _lang: &str, _accent: &str) -> ProviderResult<Vec<u8>> {
        Ok(text.as_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_llm_generates_coding_question_matching_language() {
        let llm = FakeLlm::new();
        let input = QuestionGenerationInput {
            candidate_name: "Ada".to_string(),
            job_description: "Backend role".to_string(),
            resume_text: "Years of Python".to_string(),
            coding_language: CodingLanguage::Ruby,
        };
        let questions = llm.generate_questions(&input).await.unwrap();
        let coding = questions
            .iter()
            .find(|q| q.category == QuestionCategory::Coding)
            .unwrap();
        assert_eq!(coding.coding_language, Some(CodingLanguage::Ruby));
    }

    #[tokio::test]
    async fn fake_llm_respects_injected_error() {
        let llm = FakeLlm::new();
        llm.fail_next_with(ProviderError::Quota("quota exceeded".to_string()));
        let input = QuestionGenerationInput {
            candidate_name: "Ada".to_string(),
            job_description: String::new(),
            resume_text: String::new(),
            coding_language: CodingLanguage::Python,
        };
        assert!(llm.generate_questions(&input).await.is_err());
    }
}
