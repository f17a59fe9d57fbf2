use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::CoreError;

/// LLM providers a model descriptor may name.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::OpenAi, Provider::Anthropic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// Case-insensitive parse; anything outside the closed set is unsupported.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            _ => Err(CoreError::UnsupportedProvider(s.to_string())),
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn credential_var(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn catalogue(&self) -> ProviderCatalogue {
        let (models, default): (&[&str], &str) = match self {
            Self::OpenAi => (
                &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-3.5-turbo"],
                "gpt-4o",
            ),
            Self::Anthropic => (
                &[
                    "claude-3-5-sonnet-20241022",
                    "claude-3-haiku-20240307",
                    "claude-3-opus-20240229",
                ],
                "claude-3-5-sonnet-20241022",
            ),
        };
        ProviderCatalogue {
            models: models.iter().map(|m| m.to_string()).collect(),
            default: default.to_string(),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Known models of one provider, for the supported-models listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProviderCatalogue {
    pub models: Vec<String>,
    pub default: String,
}

/// A statically configured model to benchmark.
///
/// `provider` is kept as the raw configured string so an unknown provider
/// surfaces as that model's failure at run time rather than at startup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    pub provider: String,
    pub model: String,
}

impl ModelDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            provider: provider.into(),
            model: model.into(),
        }
    }

    /// The lineup run when no models are configured.
    pub fn default_lineup() -> Vec<Self> {
        vec![
            Self::new("gpt-4o", "GPT-4o", "openai", "gpt-4o"),
            Self::new(
                "claude-3-5-sonnet",
                "Claude 3.5 Sonnet",
                "anthropic",
                "claude-3-5-sonnet-20241022",
            ),
            Self::new("gpt-4o-mini", "GPT-4o mini", "openai", "gpt-4o-mini"),
        ]
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl ModelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Terminal outcome of one model's benchmark attempt.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ModelResult {
    pub model_id: String,
    pub model_name: String,
    pub status: ModelStatus,
    pub success: bool,
    #[cfg_attr(feature = "typescript", ts(type = "number"))]
    pub execution_time_ms: u64,
    pub error_message: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub final_result: Option<String>,
}

impl ModelResult {
    pub fn completed(
        descriptor: &ModelDescriptor,
        start_time: DateTime<Utc>,
        final_result: Option<String>,
    ) -> Self {
        let end_time = Utc::now();
        Self {
            model_id: descriptor.id.clone(),
            model_name: descriptor.name.clone(),
            status: ModelStatus::Completed,
            success: true,
            execution_time_ms: elapsed_ms(start_time, end_time),
            error_message: None,
            start_time,
            end_time,
            final_result,
        }
    }

    pub fn failed(
        descriptor: &ModelDescriptor,
        start_time: DateTime<Utc>,
        error: impl Into<String>,
    ) -> Self {
        let end_time = Utc::now();
        Self {
            model_id: descriptor.id.clone(),
            model_name: descriptor.name.clone(),
            status: ModelStatus::Failed,
            success: false,
            execution_time_ms: elapsed_ms(start_time, end_time),
            error_message: Some(error.into()),
            start_time,
            end_time,
            final_result: None,
        }
    }

    /// Failed result with zero duration, for errors that escaped the runner.
    pub fn synthesized_failure(descriptor: &ModelDescriptor, error: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            model_id: descriptor.id.clone(),
            model_name: descriptor.name.clone(),
            status: ModelStatus::Failed,
            success: false,
            execution_time_ms: 0,
            error_message: Some(error.into()),
            start_time: now,
            end_time: now,
            final_result: None,
        }
    }
}

fn elapsed_ms(start: DateTime<Utc>, end: DateTime<Utc>) -> u64 {
    (end - start).num_milliseconds().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse_is_case_insensitive() {
        assert_eq!(Provider::parse("OpenAI").unwrap(), Provider::OpenAi);
        assert_eq!(Provider::parse("anthropic").unwrap(), Provider::Anthropic);
        assert_eq!(
            Provider::parse("mistral"),
            Err(CoreError::UnsupportedProvider("mistral".to_string()))
        );
    }

    #[test]
    fn test_catalogue_default_is_listed() {
        for provider in Provider::ALL {
            let catalogue = provider.catalogue();
            assert!(catalogue.models.contains(&catalogue.default));
        }
    }

    #[test]
    fn test_default_lineup_ids_are_unique() {
        let lineup = ModelDescriptor::default_lineup();
        let mut ids: Vec<_> = lineup.iter().map(|d| d.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), lineup.len());
    }

    #[test]
    fn test_synthesized_failure_has_zero_duration() {
        let descriptor = ModelDescriptor::new("m", "M", "openai", "gpt-4o");
        let result = ModelResult::synthesized_failure(&descriptor, "boom");
        assert_eq!(result.execution_time_ms, 0);
        assert_eq!(result.status, ModelStatus::Failed);
        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("boom"));
    }

    #[test]
    fn test_completed_result_measures_duration() {
        let descriptor = ModelDescriptor::new("m", "M", "openai", "gpt-4o");
        let start = Utc::now() - chrono::Duration::milliseconds(1500);
        let result = ModelResult::completed(&descriptor, start, Some("OK".to_string()));
        assert!(result.success);
        assert!(result.execution_time_ms >= 1500);
        assert_eq!(result.final_result.as_deref(), Some("OK"));
    }
}
