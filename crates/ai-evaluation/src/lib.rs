//! Evaluation Engine (C7): blends LLM resume/answer/overall scores with
//! mechanical transcript metrics and the proctoring warning log into one
//! persisted, idempotently re-computable result.

pub mod db;
pub mod error;
pub mod manager;
pub mod metrics;
pub mod types;

pub use error::{EvaluationError, Result};
pub use manager::{is_evaluable, EvaluationManager};
pub use types::{EvaluationResult, MechanicalMetrics};
