use bench_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Unsupported LLM provider: {0}")]
    UnsupportedProvider(String),

    #[error("{var} environment variable is required")]
    MissingCredential { var: &'static str },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Event stream error: {0}")]
    EventStream(String),

    #[error("TimeoutError: {0}")]
    Timeout(String),

    #[error("Agent run failed: {0}")]
    Failed(String),
}

impl From<CoreError> for AgentError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::UnsupportedProvider(provider) => AgentError::UnsupportedProvider(provider),
            other => AgentError::Failed(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
