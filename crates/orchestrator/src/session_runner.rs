//! Sequential multi-model execution of one benchmark session.
//!
//! [`SessionOrchestrator::start`] registers the session and returns at once;
//! the models then run one after another on a background task while progress
//! accumulates in the [`SessionRegistry`].

use std::sync::Arc;
use std::time::Duration;

use bench_core::{BenchmarkRequest, ModelDescriptor, ModelResult, SessionRollup, SessionStatus};
use browser_agent::LogSink;
use db::{BenchmarkStore, SessionSummary};
use tracing::{error, info, warn};

use crate::error::{OrchestratorError, Result};
use crate::model_runner::ModelRunner;
use crate::registry::{SessionRegistry, SessionUpdate};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(2);

/// Runs every configured model of a session in order.
#[derive(Clone)]
pub struct SessionOrchestrator {
    registry: SessionRegistry,
    runner: Arc<ModelRunner>,
    store: Arc<dyn BenchmarkStore>,
    models: Arc<Vec<ModelDescriptor>>,
    cooldown: Duration,
}

impl SessionOrchestrator {
    pub fn new(
        registry: SessionRegistry,
        runner: Arc<ModelRunner>,
        store: Arc<dyn BenchmarkStore>,
        models: Vec<ModelDescriptor>,
    ) -> Self {
        Self {
            registry,
            runner,
            store,
            models: Arc::new(models),
            cooldown: DEFAULT_COOLDOWN,
        }
    }

    /// Pause between two consecutive models.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn models(&self) -> &[ModelDescriptor] {
        &self.models
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Register the session and run it in the background.
    pub fn start(&self, session_id: &str, request: BenchmarkRequest) -> Result<()> {
        request.validate()?;
        self.registry.try_create(session_id, request.clone())?;

        info!(
            session_id = %session_id,
            website_url = %request.website_url,
            models = self.models.len(),
            "Benchmark session started"
        );

        let orchestrator = self.clone();
        let session_id = session_id.to_string();
        tokio::spawn(async move {
            orchestrator.run_all(&session_id, request).await;
        });
        Ok(())
    }

    /// Run all models and finalize the session.
    pub async fn run_all(&self, session_id: &str, request: BenchmarkRequest) {
        let total = self.models.len();
        let (results, failure) = match self.run_models(session_id, &request).await {
            Ok(results) => (results, None),
            Err((results, e)) => {
                error!(session_id = %session_id, error = %e, "Benchmark session failed");
                (results, Some(e.to_string()))
            }
        };

        let rollup = SessionRollup::from_results(total, &results);
        let status = if failure.is_some() {
            SessionStatus::Failed
        } else {
            SessionStatus::Completed
        };

        let sink = self.registry.sink(session_id, None);
        match &failure {
            None => sink.success(&format!(
                "🏁 Benchmark completed: {}/{} models succeeded",
                rollup.successful_models, rollup.completed_models
            )),
            Some(message) => sink.error(&format!("💥 Benchmark session failed: {}", message)),
        }

        self.registry.update(
            session_id,
            SessionUpdate::status(status)
                .with_rollup(rollup)
                .with_error(failure.clone()),
        );

        info!(
            session_id = %session_id,
            status = %status,
            completed_models = rollup.completed_models,
            successful_models = rollup.successful_models,
            "Benchmark session finished"
        );

        let summary = SessionSummary::new(session_id, &request, status, rollup, failure);
        if let Err(e) = self.store.upsert_session(&summary).await {
            warn!(session_id = %session_id, error = %e, "Failed to persist session summary");
        }
    }

    async fn run_models(
        &self,
        session_id: &str,
        request: &BenchmarkRequest,
    ) -> std::result::Result<Vec<ModelResult>, (Vec<ModelResult>, OrchestratorError)> {
        let total = self.models.len();
        let mut results = Vec::with_capacity(total);

        let running = SessionUpdate::status(SessionStatus::Running)
            .with_rollup(SessionRollup::from_results(total, &results));
        if !self.registry.update(session_id, running) {
            return Err((results, OrchestratorError::SessionNotFound(session_id.to_string())));
        }
        self.registry
            .sink(session_id, None)
            .info(&format!("🚀 Starting benchmark with {} models", total));

        for (index, descriptor) in self.models.iter().enumerate() {
            let result = self.run_guarded(session_id, descriptor, request).await;
            results.push(result.clone());

            let update = SessionUpdate::result(result)
                .with_rollup(SessionRollup::from_results(total, &results));
            if !self.registry.update(session_id, update) {
                return Err((results, OrchestratorError::SessionNotFound(session_id.to_string())));
            }

            if index + 1 < total {
                tokio::time::sleep(self.cooldown).await;
            }
        }

        Ok(results)
    }

    /// Run one model on its own task so a panic becomes a failed result.
    async fn run_guarded(
        &self,
        session_id: &str,
        descriptor: &ModelDescriptor,
        request: &BenchmarkRequest,
    ) -> ModelResult {
        let runner = Arc::clone(&self.runner);
        let task_session = session_id.to_string();
        let task_descriptor = descriptor.clone();
        let task_request = request.clone();

        let handle = tokio::spawn(async move {
            runner
                .run_one(&task_session, &task_descriptor, &task_request)
                .await
        });

        match handle.await {
            Ok(result) => result,
            Err(e) => {
                let e = OrchestratorError::TaskAborted(e.to_string());
                error!(session_id = %session_id, model = %descriptor.id, error = %e, "Model task aborted");
                self.registry
                    .sink(session_id, Some(&descriptor.id))
                    .error(&format!("❌ {} failed: {}", descriptor.name, e));
                ModelResult::synthesized_failure(descriptor, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use bench_core::{ModelStatus, Provider};
    use browser_agent::{
        AgentAction, AgentError, AgentHistory, BrowserAgent, LlmClient, LlmFactory,
        SecondToLastAction,
    };
    use db::{BenchmarkOutcome, DbError, NewBenchmark, NoopStore};
    use uuid::Uuid;

    use super::*;

    /// Agent whose behaviour and latency depend on the model it is handed.
    struct ScriptedAgent {
        calls: Mutex<Vec<String>>,
        latency_ms: fn(&str) -> u64,
    }

    #[async_trait]
    impl BrowserAgent for ScriptedAgent {
        async fn run(
            &self,
            _task: &str,
            llm: &LlmClient,
            sink: &dyn LogSink,
        ) -> browser_agent::Result<AgentHistory> {
            self.calls.lock().unwrap().push(llm.model.clone());
            tokio::time::sleep(Duration::from_millis((self.latency_ms)(&llm.model))).await;
            sink.info(&format!("working with {}", llm.model));

            match llm.model.as_str() {
                "slow-model" => Err(AgentError::Timeout("page never loaded".to_string())),
                "panicking-model" => panic!("agent crashed"),
                _ => Ok(AgentHistory::new(vec![
                    AgentAction::new("extract").with_content("OK"),
                    AgentAction::new("done").done(),
                ])),
            }
        }
    }

    /// Store that is unreachable for every operation.
    struct UnreachableStore;

    fn offline_error() -> DbError {
        DbError::Rejected {
            table: "benchmarks".to_string(),
            status: 503,
            body: "connection refused".to_string(),
        }
    }

    #[async_trait]
    impl BenchmarkStore for UnreachableStore {
        async fn insert_benchmark(&self, _benchmark: &NewBenchmark) -> std::result::Result<Uuid, DbError> {
            Err(offline_error())
        }

        async fn complete_benchmark(
            &self,
            _id: Uuid,
            _outcome: &BenchmarkOutcome,
        ) -> std::result::Result<(), DbError> {
            Err(offline_error())
        }

        async fn upsert_session(&self, _summary: &SessionSummary) -> std::result::Result<(), DbError> {
            Err(offline_error())
        }

        async fn upload_screenshot(&self, _png: &[u8]) -> std::result::Result<Option<String>, DbError> {
            Err(offline_error())
        }

        fn backend_name(&self) -> &'static str {
            "unreachable"
        }
    }

    fn orchestrator(models: Vec<ModelDescriptor>, latency_ms: fn(&str) -> u64) -> (SessionOrchestrator, Arc<ScriptedAgent>) {
        orchestrator_with_store(models, latency_ms, Arc::new(NoopStore))
    }

    fn orchestrator_with_store(
        models: Vec<ModelDescriptor>,
        latency_ms: fn(&str) -> u64,
        store: Arc<dyn BenchmarkStore>,
    ) -> (SessionOrchestrator, Arc<ScriptedAgent>) {
        let registry = SessionRegistry::new();
        let agent = Arc::new(ScriptedAgent {
            calls: Mutex::new(Vec::new()),
            latency_ms,
        });
        let llm = LlmFactory::new().with_credential(Provider::OpenAi, "sk");
        let runner = ModelRunner::new(
            registry.clone(),
            llm,
            agent.clone(),
            store.clone(),
            Arc::new(SecondToLastAction),
        );
        let orchestrator =
            SessionOrchestrator::new(registry, Arc::new(runner), store, models)
                .with_cooldown(Duration::from_millis(50));
        (orchestrator, agent)
    }

    fn model(id: &str) -> ModelDescriptor {
        ModelDescriptor::new(id, id.to_uppercase(), "openai", id)
    }

    fn request() -> BenchmarkRequest {
        BenchmarkRequest::new("user-1", "https://example.com", "find the pricing page")
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_and_success_rollup() {
        let (orchestrator, _) = orchestrator(vec![model("slow-model"), model("fast-model")], |_| 10);
        orchestrator.registry().create("s-1", request());
        orchestrator.run_all("s-1", request()).await;

        let snapshot = orchestrator.registry().get("s-1").unwrap();
        assert_eq!(snapshot.status, SessionStatus::Completed);
        assert_eq!(snapshot.rollup.total_models, 2);
        assert_eq!(snapshot.rollup.completed_models, 2);
        assert_eq!(snapshot.rollup.successful_models, 1);

        let slow = &snapshot.model_results[0];
        assert_eq!(slow.status, ModelStatus::Failed);
        assert!(slow.error_message.as_deref().unwrap().contains("TimeoutError"));

        let fast = &snapshot.model_results[1];
        assert!(fast.success);
        assert_eq!(fast.final_result.as_deref(), Some("OK"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_models_run_in_configured_order() {
        // latencies deliberately disagree with the configured order
        let ids = ["m-7", "m-2", "m-9", "m-1", "m-5"];
        let (orchestrator, agent) = orchestrator(ids.iter().map(|id| model(id)).collect(), |m| {
            let n: u64 = m.trim_start_matches("m-").parse().unwrap_or(0);
            (n * 37) % 11 * 25
        });
        orchestrator.registry().create("s-1", request());
        orchestrator.run_all("s-1", request()).await;

        let calls = agent.calls.lock().unwrap().clone();
        assert_eq!(calls, ids);

        let snapshot = orchestrator.registry().get("s-1").unwrap();
        let order: Vec<&str> = snapshot.model_results.iter().map(|r| r.model_id.as_str()).collect();
        assert_eq!(order, ids);
        let log_models: Vec<&str> = snapshot
            .logs
            .iter()
            .filter(|l| l.message.starts_with("working with"))
            .filter_map(|l| l.model_id.as_deref())
            .collect();
        assert_eq!(log_models, ids);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panic_becomes_failed_result() {
        let (orchestrator, _) =
            orchestrator(vec![model("panicking-model"), model("fast-model")], |_| 1);
        orchestrator.registry().create("s-1", request());
        orchestrator.run_all("s-1", request()).await;

        let snapshot = orchestrator.registry().get("s-1").unwrap();
        assert_eq!(snapshot.status, SessionStatus::Completed);
        let crashed = &snapshot.model_results[0];
        assert_eq!(crashed.status, ModelStatus::Failed);
        assert_eq!(crashed.execution_time_ms, 0);
        assert!(crashed.error_message.as_deref().unwrap().starts_with("Model task aborted"));
        assert!(snapshot.model_results[1].success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rollup_counts_are_consistent() {
        let (orchestrator, _) = orchestrator(
            vec![model("a"), model("slow-model"), model("b"), model("slow-model-2")],
            |_| 5,
        );
        orchestrator.registry().create("s-1", request());
        orchestrator.run_all("s-1", request()).await;

        let snapshot = orchestrator.registry().get("s-1").unwrap();
        assert_eq!(snapshot.rollup.completed_models as usize, snapshot.model_results.len());
        assert!(snapshot.rollup.successful_models <= snapshot.rollup.completed_models);
        assert_eq!(snapshot.rollup.successful_models, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deleted_session_fails_without_panicking() {
        let (orchestrator, _) = orchestrator(vec![model("a")], |_| 1);
        orchestrator.run_all("never-created", request()).await;
        assert!(orchestrator.registry().get("never-created").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_returns_immediately_and_rejects_reuse() {
        let (orchestrator, _) = orchestrator(vec![model("a"), model("b")], |_| 500);
        orchestrator.start("s-1", request()).unwrap();
        assert_eq!(
            orchestrator.registry().status("s-1"),
            Some(SessionStatus::Starting)
        );

        let err = orchestrator.start("s-1", request()).unwrap_err();
        assert!(matches!(err, OrchestratorError::SessionExists(_)));

        let err = orchestrator
            .start("s-2", BenchmarkRequest::new("user-1", "", "task"))
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidRequest(_)));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(
            orchestrator.registry().status("s-1"),
            Some(SessionStatus::Completed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_storage_does_not_affect_the_session() {
        let (orchestrator, _) = orchestrator_with_store(
            vec![model("a"), model("b")],
            |_| 10,
            Arc::new(UnreachableStore),
        );
        orchestrator.registry().create("s-1", request());
        orchestrator.run_all("s-1", request()).await;

        let snapshot = orchestrator.registry().get("s-1").unwrap();
        assert_eq!(snapshot.status, SessionStatus::Completed);
        assert!(snapshot.error_message.is_none());
        assert_eq!(snapshot.rollup.total_models, 2);
        assert_eq!(snapshot.rollup.completed_models, 2);
        assert_eq!(snapshot.rollup.successful_models, 2);
        assert!(snapshot
            .model_results
            .iter()
            .all(|r| r.final_result.as_deref() == Some("OK")));
    }
}
