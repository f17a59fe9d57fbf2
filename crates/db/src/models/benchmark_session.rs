use bench_core::{BenchmarkRequest, SessionRollup, SessionStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::timestamp_to_datetime;

/// Session-level rollup (`benchmark_sessions` table).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub user_id: String,
    pub website_url: String,
    pub task_description: String,
    pub status: SessionStatus,
    pub total_models: u32,
    pub completed_models: u32,
    pub successful_models: u32,
    pub error_message: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl SessionSummary {
    pub fn new(
        session_id: &str,
        request: &BenchmarkRequest,
        status: SessionStatus,
        rollup: SessionRollup,
        error_message: Option<String>,
    ) -> Self {
        Self {
            session_id: session_id.to_string(),
            user_id: request.user_id.clone(),
            website_url: request.website_url.clone(),
            task_description: request.task_description.clone(),
            status,
            total_models: rollup.total_models,
            completed_models: rollup.completed_models,
            successful_models: rollup.successful_models,
            error_message,
            completed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionSummaryRow {
    pub session_id: String,
    pub user_id: String,
    pub website_url: String,
    pub task_description: String,
    pub status: String,
    pub total_models: i64,
    pub completed_models: i64,
    pub successful_models: i64,
    pub error_message: Option<String>,
    pub completed_at: i64,
}

impl SessionSummaryRow {
    pub fn into_domain(self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id,
            user_id: self.user_id,
            website_url: self.website_url,
            task_description: self.task_description,
            status: SessionStatus::parse(&self.status).unwrap_or_default(),
            total_models: self.total_models as u32,
            completed_models: self.completed_models as u32,
            successful_models: self.successful_models as u32,
            error_message: self.error_message,
            completed_at: timestamp_to_datetime(self.completed_at),
        }
    }
}
