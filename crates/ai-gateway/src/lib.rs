//! AI capability abstraction and degradation behavior (C5).

pub mod capability;
pub mod error;
pub mod fake;
pub mod followup;
pub mod gateway;
pub mod parse;
pub mod quota;
pub mod ratelimit;

pub use capability::{
    is_retriable, AnswersEvaluation, AsrCapability, GeneratedQuestion, LlmCapability, OcrResult,
    OverallEvaluation, QuestionCategory, QuestionGenerationInput, ResumeEvaluation, TtsCapability,
};
pub use error::{GatewayError, ProviderError, Result};
pub use fake::{FakeAsr, FakeLlm, FakeTts};
pub use gateway::AiGateway;
pub use quota::QuotaState;
pub use ratelimit::RateLimiter;
