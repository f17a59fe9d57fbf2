use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{LogEntry, ModelResult, SessionStatus};

/// Rollup delivered once, when a session reaches a terminal status.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct CompletionSummary {
    pub status: SessionStatus,
    pub success: bool,
    pub total_models: u32,
    pub completed_models: u32,
    pub successful_models: u32,
    /// Keyed by model id.
    pub model_results: BTreeMap<String, ModelResult>,
    pub error_message: Option<String>,
}

/// One server-push event of a session stream.
///
/// Serialized as `{"type": "...", "data": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum StreamUpdate {
    Log(LogEntry),
    Status { status: SessionStatus },
    Completion(CompletionSummary),
    Error { message: String },
}

impl StreamUpdate {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Log(_) => "log",
            Self::Status { .. } => "status",
            Self::Completion(_) => "completion",
            Self::Error { .. } => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completion(_) | Self::Error { .. })
    }
}
