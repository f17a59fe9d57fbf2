use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::history::AgentHistory;
use crate::llm::LlmClient;
use crate::sink::LogSink;

/// A browser-automation agent that carries out one natural-language task.
///
/// The agent owns its retry budget. Progress is reported through `sink`
/// while the run is in flight; the returned history is the only result.
#[async_trait]
pub trait BrowserAgent: Send + Sync {
    async fn run(&self, task: &str, llm: &LlmClient, sink: &dyn LogSink) -> Result<AgentHistory>;
}

/// Retry and capability knobs passed through to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub max_failures: u32,
    pub retry_delay_secs: u64,
    pub use_vision: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            max_failures: 3,
            retry_delay_secs: 2,
            use_vision: true,
        }
    }
}
