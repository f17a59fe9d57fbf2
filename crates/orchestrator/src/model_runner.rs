use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use bench_core::{BenchmarkRequest, ModelDescriptor, ModelResult};
use browser_agent::{AgentHistory, BrowserAgent, LlmFactory, LogSink, ResultExtractor};
use chrono::{DateTime, Utc};
use db::{AgentStep, BenchmarkOutcome, BenchmarkStore, NewBenchmark};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::registry::{SessionRegistry, SessionSink};

/// Runs one model of a session against the browser agent.
///
/// Every failure is contained here: [`run_one`](Self::run_one) always returns
/// a terminal [`ModelResult`].
pub struct ModelRunner {
    registry: SessionRegistry,
    llm: LlmFactory,
    agent: Arc<dyn BrowserAgent>,
    store: Arc<dyn BenchmarkStore>,
    extractor: Arc<dyn ResultExtractor>,
}

#[derive(Default)]
struct Attempt {
    record_id: Option<Uuid>,
    steps: Vec<AgentStep>,
    browser_logs: Vec<serde_json::Value>,
    screenshot: Option<String>,
}

impl ModelRunner {
    pub fn new(
        registry: SessionRegistry,
        llm: LlmFactory,
        agent: Arc<dyn BrowserAgent>,
        store: Arc<dyn BenchmarkStore>,
        extractor: Arc<dyn ResultExtractor>,
    ) -> Self {
        Self {
            registry,
            llm,
            agent,
            store,
            extractor,
        }
    }

    pub async fn run_one(
        &self,
        session_id: &str,
        descriptor: &ModelDescriptor,
        request: &BenchmarkRequest,
    ) -> ModelResult {
        let sink = self.registry.sink(session_id, Some(&descriptor.id));
        let start_time = Utc::now();
        let mut attempt = Attempt::default();

        sink.info(&format!("🤖 Starting benchmark with {}", descriptor.name));

        match self
            .attempt(session_id, descriptor, request, start_time, &sink, &mut attempt)
            .await
        {
            Ok(final_result) => {
                let result = ModelResult::completed(descriptor, start_time, final_result);
                sink.success(&format!(
                    "🎉 {} completed in {:.1}s",
                    descriptor.name,
                    result.execution_time_ms as f64 / 1000.0
                ));
                info!(
                    session_id = %session_id,
                    model = %descriptor.id,
                    execution_time_ms = result.execution_time_ms,
                    "Model run completed"
                );
                self.persist_outcome(session_id, descriptor, request, &result, attempt)
                    .await;
                result
            }
            Err(e) => {
                let result = ModelResult::failed(descriptor, start_time, e.to_string());
                sink.error(&format!("❌ {} failed: {}", descriptor.name, e));
                warn!(session_id = %session_id, model = %descriptor.id, error = %e, "Model run failed");
                self.persist_outcome(session_id, descriptor, request, &result, attempt)
                    .await;
                result
            }
        }
    }

    async fn attempt(
        &self,
        session_id: &str,
        descriptor: &ModelDescriptor,
        request: &BenchmarkRequest,
        start_time: DateTime<Utc>,
        sink: &SessionSink,
        attempt: &mut Attempt,
    ) -> Result<Option<String>> {
        let llm = self.llm.resolve(&descriptor.provider, &descriptor.model)?;

        let task = request.agent_task();
        sink.info(&format!("📋 Task: {}", task));

        let record = NewBenchmark::running(session_id, request, descriptor, start_time);
        match self.store.insert_benchmark(&record).await {
            Ok(id) => attempt.record_id = Some(id),
            Err(e) => warn!(session_id = %session_id, model = %descriptor.id, error = %e, "Failed to persist running benchmark"),
        }

        let history = self.agent.run(&task, &llm, sink).await?;
        attempt.steps = agent_steps(&history);
        attempt.browser_logs = history.browser_logs.clone();
        attempt.screenshot = history.final_screenshot.clone();

        let final_result = self.extractor.extract(&history);
        match &final_result {
            Some(text) => sink.success(&format!("📄 Final result: {}", text)),
            None => sink.warning("⚠️ Could not extract a final result from the agent history"),
        }
        Ok(final_result)
    }

    async fn persist_outcome(
        &self,
        session_id: &str,
        descriptor: &ModelDescriptor,
        request: &BenchmarkRequest,
        result: &ModelResult,
        attempt: Attempt,
    ) {
        let record_id = match attempt.record_id {
            Some(id) => id,
            None => {
                let record = NewBenchmark::running(session_id, request, descriptor, result.start_time);
                match self.store.insert_benchmark(&record).await {
                    Ok(id) => id,
                    Err(e) => {
                        warn!(session_id = %session_id, model = %descriptor.id, error = %e, "Failed to persist benchmark");
                        return;
                    }
                }
            }
        };

        let screenshot_url = match attempt.screenshot.as_deref() {
            Some(encoded) => self.upload_screenshot(session_id, descriptor, encoded).await,
            None => None,
        };
        let outcome = BenchmarkOutcome::from_result(result, attempt.steps)
            .with_browser_logs(attempt.browser_logs)
            .with_screenshot_url(screenshot_url);
        if let Err(e) = self.store.complete_benchmark(record_id, &outcome).await {
            warn!(session_id = %session_id, model = %descriptor.id, error = %e, "Failed to persist benchmark outcome");
        }
    }

    /// Best effort: any failure is logged and the outcome is stored without a URL.
    async fn upload_screenshot(
        &self,
        session_id: &str,
        descriptor: &ModelDescriptor,
        encoded: &str,
    ) -> Option<String> {
        let png = match BASE64_STANDARD.decode(encoded) {
            Ok(png) => png,
            Err(e) => {
                warn!(session_id = %session_id, model = %descriptor.id, error = %e, "Screenshot is not valid base64");
                return None;
            }
        };
        match self.store.upload_screenshot(&png).await {
            Ok(url) => url,
            Err(e) => {
                warn!(session_id = %session_id, model = %descriptor.id, error = %e, "Failed to upload screenshot");
                None
            }
        }
    }
}

fn agent_steps(history: &AgentHistory) -> Vec<AgentStep> {
    history
        .actions
        .iter()
        .enumerate()
        .map(|(i, action)| AgentStep {
            step: i as u32 + 1,
            action: action.action.clone(),
            result: action
                .extracted_content
                .clone()
                .or_else(|| action.error.clone()),
        })
        .collect()
}
