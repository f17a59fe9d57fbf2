use bench_core::CoreError;
use browser_agent::AgentError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session already exists: {0}")]
    SessionExists(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Model task aborted: {0}")]
    TaskAborted(String),
}

impl From<CoreError> for OrchestratorError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(message) => Self::InvalidRequest(message),
            other => Self::Agent(AgentError::from(other)),
        }
    }
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
