use thiserror::Error;

/// Errors a capability implementation may raise. The gateway classifies
/// these to decide retry vs. fallback vs. quota-exhaustion (§4.5).
#[derive(Debug, Error, Clone)]
pub enum ProviderError {
    #[error("transient network error: {0}")]
    Network(String),

    #[error("rate limited or quota exhausted: {0}")]
    Quota(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("could not parse provider response: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("AI Gateway is quota-exhausted and AI_QUOTA_HARD_FAIL is set")]
    HardFailQuotaExhausted,

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl GatewayError {
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::HardFailQuotaExhausted => "QUOTA_EXHAUSTED_HARD_FAIL",
            GatewayError::Provider(_) => "PROVIDER_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
