use std::collections::HashMap;

use bench_core::Provider;
use serde::Serialize;
use tracing::warn;

use crate::error::{AgentError, Result};

/// Handle to a provider-backed chat model, handed to the agent.
#[derive(Clone, Serialize)]
pub struct LlmClient {
    pub provider: Provider,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
}

impl std::fmt::Debug for LlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmClient")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Resolves model descriptors to [`LlmClient`]s using per-provider credentials.
#[derive(Clone, Default)]
pub struct LlmFactory {
    credentials: HashMap<Provider, String>,
}

impl LlmFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every provider's credential from the environment.
    ///
    /// A missing key only disables that provider; resolving one of its
    /// models later fails with [`AgentError::MissingCredential`].
    pub fn from_env() -> Self {
        let mut factory = Self::new();
        for provider in Provider::ALL {
            match std::env::var(provider.credential_var()) {
                Ok(key) if !key.trim().is_empty() => {
                    factory.credentials.insert(provider, key);
                }
                _ => warn!(
                    provider = %provider,
                    var = provider.credential_var(),
                    "Provider credential not set, its models will fail"
                ),
            }
        }
        factory
    }

    pub fn with_credential(mut self, provider: Provider, api_key: impl Into<String>) -> Self {
        self.credentials.insert(provider, api_key.into());
        self
    }

    pub fn has_credential(&self, provider: Provider) -> bool {
        self.credentials.contains_key(&provider)
    }

    pub fn resolve(&self, provider: &str, model: &str) -> Result<LlmClient> {
        let provider = Provider::parse(provider)?;
        let api_key = self
            .credentials
            .get(&provider)
            .cloned()
            .ok_or(AgentError::MissingCredential {
                var: provider.credential_var(),
            })?;

        Ok(LlmClient {
            provider,
            model: model.to_string(),
            api_key,
            temperature: 0.0,
        })
    }
}
