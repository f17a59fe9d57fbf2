use async_trait::async_trait;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::agent::{AgentSettings, BrowserAgent};
use crate::error::{AgentError, Result};
use crate::history::AgentHistory;
use crate::llm::LlmClient;
use crate::sink::{classify_line, LineSeverity, LogSink};

#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    task: &'a str,
    llm: &'a LlmClient,
    #[serde(flatten)]
    settings: &'a AgentSettings,
}

#[derive(Debug, Deserialize)]
struct LogLine {
    #[serde(default)]
    level: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct StepEvent {
    step: u32,
    action: String,
    #[serde(default)]
    result: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEvent {
    #[serde(default)]
    kind: Option<String>,
    message: String,
}

/// [`BrowserAgent`] backed by an external browser-automation service.
///
/// `POST {base_url}/run` either answers with the history as JSON or streams
/// server-sent events named `log`, `step`, `result` and `error`.
#[derive(Clone)]
pub struct RemoteAgent {
    base_url: String,
    settings: AgentSettings,
    client: Client,
}

impl RemoteAgent {
    pub fn new(base_url: impl Into<String>, settings: AgentSettings) -> Self {
        Self::with_client(base_url, settings, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, settings: AgentSettings, client: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            settings,
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn map_request_error(err: reqwest::Error) -> AgentError {
        if err.is_timeout() {
            AgentError::Timeout(err.to_string())
        } else {
            AgentError::Request(err)
        }
    }

    fn error_from_event(event: ErrorEvent) -> AgentError {
        match event.kind.as_deref() {
            Some("timeout") | Some("TimeoutError") => AgentError::Timeout(event.message),
            _ => AgentError::Failed(event.message),
        }
    }

    async fn consume_events(response: reqwest::Response, sink: &dyn LogSink) -> Result<AgentHistory> {
        let mut events = response.bytes_stream().eventsource();

        while let Some(event) = events.next().await {
            let event = event.map_err(|e| AgentError::EventStream(e.to_string()))?;
            if event.data.is_empty() {
                continue;
            }

            match event.event.as_str() {
                "log" => match serde_json::from_str::<LogLine>(&event.data) {
                    Ok(line) => {
                        if let Some((level, message)) =
                            classify_line(LineSeverity::parse(&line.level), &line.message)
                        {
                            sink.emit(level, &message, None);
                        }
                    }
                    Err(e) => debug!(error = %e, data = %event.data, "Skipping malformed log event"),
                },
                "step" => match serde_json::from_str::<StepEvent>(&event.data) {
                    Ok(step) => sink.action(
                        &step.action,
                        Some(serde_json::json!({ "step": step.step, "result": step.result })),
                    ),
                    Err(e) => debug!(error = %e, data = %event.data, "Skipping malformed step event"),
                },
                "result" => {
                    return serde_json::from_str::<AgentHistory>(&event.data)
                        .map_err(|e| AgentError::InvalidResponse(e.to_string()));
                }
                "error" => {
                    let payload = serde_json::from_str::<ErrorEvent>(&event.data).unwrap_or(ErrorEvent {
                        kind: None,
                        message: event.data.clone(),
                    });
                    return Err(Self::error_from_event(payload));
                }
                other => debug!(event_type = %other, "Ignoring unknown agent event"),
            }
        }

        Err(AgentError::InvalidResponse(
            "event stream ended without a result".to_string(),
        ))
    }
}

#[async_trait]
impl BrowserAgent for RemoteAgent {
    async fn run(&self, task: &str, llm: &LlmClient, sink: &dyn LogSink) -> Result<AgentHistory> {
        let url = format!("{}/run", self.base_url);
        debug!(url = %url, model = %llm.model, "Dispatching agent run");

        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "text/event-stream, application/json")
            .json(&RunRequest {
                task,
                llm,
                settings: &self.settings,
            })
            .send()
            .await
            .map_err(Self::map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Agent service rejected the run");
            return Err(AgentError::Failed(format!(
                "agent service returned {}: {}",
                status, body
            )));
        }

        let is_stream = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/event-stream"));

        if is_stream {
            Self::consume_events(response, sink).await
        } else {
            response
                .json::<AgentHistory>()
                .await
                .map_err(|e| AgentError::InvalidResponse(e.to_string()))
        }
    }
}
