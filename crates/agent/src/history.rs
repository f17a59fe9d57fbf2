use serde::{Deserialize, Serialize};

/// One recorded action of an agent run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentAction {
    /// Name or short description of what the agent did.
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub extracted_content: Option<String>,
    #[serde(default)]
    pub is_done: bool,
    #[serde(default)]
    pub error: Option<String>,
}

impl AgentAction {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.extracted_content = Some(content.into());
        self
    }

    pub fn done(mut self) -> Self {
        self.is_done = true;
        self
    }
}

/// Ordered action history returned by a successful agent run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentHistory {
    #[serde(default)]
    pub actions: Vec<AgentAction>,
    /// Base64 PNG of the page when the run ended.
    #[serde(default)]
    pub final_screenshot: Option<String>,
    /// Console and network entries captured by the browser, passed through as-is.
    #[serde(default)]
    pub browser_logs: Vec<serde_json::Value>,
}

impl AgentHistory {
    pub fn new(actions: Vec<AgentAction>) -> Self {
        Self {
            actions,
            ..Default::default()
        }
    }

    pub fn with_screenshot(mut self, png_base64: impl Into<String>) -> Self {
        self.final_screenshot = Some(png_base64.into());
        self
    }

    pub fn with_browser_logs(mut self, logs: Vec<serde_json::Value>) -> Self {
        self.browser_logs = logs;
        self
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}
