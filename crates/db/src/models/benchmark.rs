use bench_core::{BenchmarkRequest, ModelDescriptor, ModelResult, ModelStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::timestamp_to_datetime;

/// One step of the agent's action history, as stored with a benchmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStep {
    pub step: u32,
    pub action: String,
    pub result: Option<String>,
}

/// Row written when a model starts running (`benchmarks` table).
#[derive(Debug, Clone, Serialize)]
pub struct NewBenchmark {
    pub id: Uuid,
    pub session_id: String,
    pub user_id: String,
    pub website_url: String,
    pub task_description: String,
    pub llm_provider: String,
    pub model: String,
    pub model_name: String,
    pub status: ModelStatus,
    pub started_at: DateTime<Utc>,
}

impl NewBenchmark {
    pub fn running(
        session_id: &str,
        request: &BenchmarkRequest,
        descriptor: &ModelDescriptor,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.to_string(),
            user_id: request.user_id.clone(),
            website_url: request.website_url.clone(),
            task_description: request.task_description.clone(),
            llm_provider: descriptor.provider.clone(),
            model: descriptor.model.clone(),
            model_name: descriptor.name.clone(),
            status: ModelStatus::Running,
            started_at,
        }
    }
}

/// Terminal fields patched onto a benchmark row.
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkOutcome {
    pub status: ModelStatus,
    pub success: bool,
    pub execution_time_ms: u64,
    pub error_message: Option<String>,
    pub final_result: Option<String>,
    pub agent_steps: Vec<AgentStep>,
    pub browser_logs: Vec<serde_json::Value>,
    pub screenshot_url: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl BenchmarkOutcome {
    pub fn from_result(result: &ModelResult, agent_steps: Vec<AgentStep>) -> Self {
        Self {
            status: result.status,
            success: result.success,
            execution_time_ms: result.execution_time_ms,
            error_message: result.error_message.clone(),
            final_result: result.final_result.clone(),
            agent_steps,
            browser_logs: Vec::new(),
            screenshot_url: None,
            completed_at: result.end_time,
        }
    }

    pub fn with_browser_logs(mut self, browser_logs: Vec<serde_json::Value>) -> Self {
        self.browser_logs = browser_logs;
        self
    }

    pub fn with_screenshot_url(mut self, screenshot_url: Option<String>) -> Self {
        self.screenshot_url = screenshot_url;
        self
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BenchmarkRow {
    pub id: String,
    pub session_id: String,
    pub user_id: String,
    pub website_url: String,
    pub task_description: String,
    pub llm_provider: String,
    pub model: String,
    pub model_name: String,
    pub status: String,
    pub success: Option<bool>,
    pub execution_time_ms: Option<i64>,
    pub error_message: Option<String>,
    pub final_result: Option<String>,
    pub agent_steps: String,
    pub browser_logs: String,
    pub screenshot_url: Option<String>,
    pub started_at: i64,
    pub completed_at: Option<i64>,
}

/// A stored benchmark row read back from the local store.
#[derive(Debug, Clone)]
pub struct Benchmark {
    pub id: Uuid,
    pub session_id: String,
    pub user_id: String,
    pub website_url: String,
    pub task_description: String,
    pub llm_provider: String,
    pub model: String,
    pub model_name: String,
    pub status: ModelStatus,
    pub success: Option<bool>,
    pub execution_time_ms: Option<u64>,
    pub error_message: Option<String>,
    pub final_result: Option<String>,
    pub agent_steps: Vec<AgentStep>,
    pub browser_logs: Vec<serde_json::Value>,
    pub screenshot_url: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl BenchmarkRow {
    pub fn into_domain(self) -> Benchmark {
        Benchmark {
            id: Uuid::parse_str(&self.id).unwrap_or_default(),
            session_id: self.session_id,
            user_id: self.user_id,
            website_url: self.website_url,
            task_description: self.task_description,
            llm_provider: self.llm_provider,
            model: self.model,
            model_name: self.model_name,
            status: ModelStatus::parse(&self.status).unwrap_or_default(),
            success: self.success,
            execution_time_ms: self.execution_time_ms.map(|ms| ms.max(0) as u64),
            error_message: self.error_message,
            final_result: self.final_result,
            agent_steps: serde_json::from_str(&self.agent_steps).unwrap_or_default(),
            browser_logs: serde_json::from_str(&self.browser_logs).unwrap_or_default(),
            screenshot_url: self.screenshot_url,
            started_at: timestamp_to_datetime(self.started_at),
            completed_at: self.completed_at.map(timestamp_to_datetime),
        }
    }
}
