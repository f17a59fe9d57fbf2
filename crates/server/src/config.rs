use std::path::{Path, PathBuf};
use std::time::Duration;

use bench_core::ModelDescriptor;
use browser_agent::{AgentSettings, ExtractorKind};
use orchestrator::PublisherConfig;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

pub const DEFAULT_CONFIG_FILE: &str = "webbench.toml";
pub const DEFAULT_PORT: u16 = 8000;

pub const ENV_SUPABASE_URL: &str = "NEXT_PUBLIC_SUPABASE_URL";
pub const ENV_SUPABASE_KEY: &str = "SUPABASE_SERVICE_ROLE_KEY";
pub const ENV_AGENT_URL: &str = "BROWSER_AGENT_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSection {
    /// Base URL of the browser-automation service.
    pub url: String,
    #[serde(flatten)]
    pub settings: AgentSettings,
    pub extractor: ExtractorKind,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            url: "http://localhost:8001".to_string(),
            settings: AgentSettings::default(),
            extractor: ExtractorKind::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkSection {
    pub cooldown_ms: u64,
    pub poll_interval_ms: u64,
    pub cleanup_grace_secs: u64,
}

impl Default for BenchmarkSection {
    fn default() -> Self {
        Self {
            cooldown_ms: 2000,
            poll_interval_ms: 1000,
            cleanup_grace_secs: 60,
        }
    }
}

impl BenchmarkSection {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn publisher(&self) -> PublisherConfig {
        PublisherConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            cleanup_grace: Duration::from_secs(self.cleanup_grace_secs),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Supabase,
    Sqlite,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub backend: StorageBackend,
    pub supabase_url: Option<String>,
    /// Only ever read from the environment.
    #[serde(skip)]
    pub supabase_service_key: Option<String>,
    pub sqlite_path: PathBuf,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            supabase_url: None,
            supabase_service_key: None,
            sqlite_path: PathBuf::from("webbench.db"),
        }
    }
}

/// Service configuration, read from TOML and overridden by the environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerSection,
    pub agent: AgentSection,
    pub benchmark: BenchmarkSection,
    pub storage: StorageSection,
    pub models: Vec<ModelDescriptor>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            server: ServerSection::default(),
            agent: AgentSection::default(),
            benchmark: BenchmarkSection::default(),
            storage: StorageSection::default(),
            models: ModelDescriptor::default_lineup(),
        }
    }
}

impl ServiceConfig {
    /// Read config from `path`, falling back to defaults when it is missing
    /// or unreadable.
    pub async fn read(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "Config file does not exist, using defaults");
            return Self::default();
        }

        match fs::read_to_string(path).await {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    debug!(path = %path.display(), "Config loaded successfully");
                    config
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                Self::default()
            }
        }
    }

    pub async fn write(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(path, content).await?;
        debug!(path = %path.display(), "Config saved successfully");
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_SUPABASE_URL) {
            self.storage.supabase_url = Some(url);
        }
        if let Some(key) = get(ENV_SUPABASE_KEY) {
            self.storage.supabase_service_key = Some(key);
        }
        if let Some(url) = get(ENV_AGENT_URL) {
            self.agent.url = url;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_read_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let config = ServiceConfig::read(&temp_dir.path().join("missing.toml")).await;
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.models.len(), 3);
        assert_eq!(config.benchmark.cooldown(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_config_parses_partial_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("webbench.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 9000

[agent]
url = "http://agent:8001"
max_failures = 5
extractor = "last_done"

[storage]
backend = "sqlite"
sqlite_path = "data/bench.db"

[[models]]
id = "gpt-4o"
name = "GPT-4o"
provider = "openai"
model = "gpt-4o"
"#,
        )
        .unwrap();

        let config = ServiceConfig::read(&path).await;
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.agent.settings.max_failures, 5);
        assert_eq!(config.agent.settings.retry_delay_secs, 2);
        assert_eq!(config.agent.extractor, ExtractorKind::LastDone);
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.models.len(), 1);
        assert_eq!(config.benchmark.poll_interval_ms, 1000);
    }

    #[tokio::test]
    async fn test_invalid_file_falls_back_to_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("webbench.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();

        assert_eq!(ServiceConfig::read(&path).await, ServiceConfig::default());
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/webbench.toml");
        let mut config = ServiceConfig::default();
        config.benchmark.cooldown_ms = 10;
        config.storage.supabase_service_key = Some("secret".to_string());

        config.write(&path).await.unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("secret"));

        let loaded = ServiceConfig::read(&path).await;
        assert_eq!(loaded.benchmark.cooldown_ms, 10);
        assert_eq!(loaded.storage.supabase_service_key, None);
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_SUPABASE_URL, "https://project.supabase.co"),
            (ENV_SUPABASE_KEY, "service-role"),
            (ENV_AGENT_URL, "  "),
        ]);
        let mut config = ServiceConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(
            config.storage.supabase_url.as_deref(),
            Some("https://project.supabase.co")
        );
        assert_eq!(config.storage.supabase_service_key.as_deref(), Some("service-role"));
        assert_eq!(config.agent.url, "http://localhost:8001");
    }
}
