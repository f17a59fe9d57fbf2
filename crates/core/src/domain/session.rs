use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{LogEntry, ModelResult};
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Starting,
    Running,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "starting" => Some(Self::Starting),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Starting => 0,
            Self::Running => 1,
            Self::Completed | Self::Failed => 2,
        }
    }

    /// Status only moves forward; terminal states are final.
    pub fn can_advance_to(&self, next: SessionStatus) -> bool {
        if self.is_terminal() {
            return *self == next;
        }
        next.rank() >= self.rank()
    }

    pub fn advance(&self, next: SessionStatus) -> Result<SessionStatus, CoreError> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters a caller supplies when starting a benchmark session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct BenchmarkRequest {
    pub user_id: String,
    pub website_url: String,
    pub task_description: String,
}

impl BenchmarkRequest {
    pub fn new(
        user_id: impl Into<String>,
        website_url: impl Into<String>,
        task_description: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            website_url: website_url.into(),
            task_description: task_description.into(),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        for (field, value) in [
            ("user_id", &self.user_id),
            ("website_url", &self.website_url),
            ("task_description", &self.task_description),
        ] {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!("{} must not be empty", field)));
            }
        }
        Ok(())
    }

    /// Instruction handed to the browser agent.
    pub fn agent_task(&self) -> String {
        format!("Go to {} and {}", self.website_url, self.task_description)
    }
}

/// Aggregate counts over a session's model results.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct SessionRollup {
    pub total_models: u32,
    pub completed_models: u32,
    pub successful_models: u32,
}

impl SessionRollup {
    pub fn from_results(total_models: usize, results: &[ModelResult]) -> Self {
        Self {
            total_models: total_models as u32,
            completed_models: results.len() as u32,
            successful_models: results.iter().filter(|r| r.success).count() as u32,
        }
    }
}

/// Point-in-time copy of a live session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct SessionSnapshot {
    pub session_id: String,
    pub status: SessionStatus,
    pub request: BenchmarkRequest,
    pub logs: Vec<LogEntry>,
    /// Results in execution order.
    pub model_results: Vec<ModelResult>,
    pub rollup: SessionRollup,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}
