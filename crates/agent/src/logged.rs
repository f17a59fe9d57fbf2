use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use bench_core::LogLevel;
use serde_json::Value;
use tracing::debug;

use crate::agent::BrowserAgent;
use crate::error::Result;
use crate::history::AgentHistory;
use crate::llm::LlmClient;
use crate::sink::LogSink;

/// Decorator that narrates an agent run into the caller's [`LogSink`].
///
/// Emits a launch line before the run and a success or error line after it.
/// Action events from the inner agent are numbered in arrival order so each
/// one carries a `step` in its payload.
pub struct LoggedAgent<A> {
    inner: A,
}

impl<A: BrowserAgent> LoggedAgent<A> {
    pub fn new(inner: A) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }
}

struct StepSink<'a> {
    inner: &'a dyn LogSink,
    steps: AtomicU32,
}

impl LogSink for StepSink<'_> {
    fn emit(&self, level: LogLevel, message: &str, data: Option<Value>) {
        if level != LogLevel::Action {
            self.inner.emit(level, message, data);
            return;
        }

        let step = self.steps.fetch_add(1, Ordering::SeqCst) + 1;
        let data = match data {
            Some(Value::Object(mut map)) => {
                map.entry("step").or_insert_with(|| Value::from(step));
                Value::Object(map)
            }
            Some(other) => serde_json::json!({ "step": step, "detail": other }),
            None => serde_json::json!({ "step": step }),
        };
        self.inner.emit(level, message, Some(data));
    }
}

#[async_trait]
impl<A: BrowserAgent> BrowserAgent for LoggedAgent<A> {
    async fn run(&self, task: &str, llm: &LlmClient, sink: &dyn LogSink) -> Result<AgentHistory> {
        sink.info("🚀 Launching browser...");
        debug!(provider = %llm.provider, model = %llm.model, "Starting agent run");

        let steps = StepSink {
            inner: sink,
            steps: AtomicU32::new(0),
        };

        match self.inner.run(task, llm, &steps).await {
            Ok(history) => {
                sink.success(&format!(
                    "✅ Agent finished after {} actions",
                    history.len()
                ));
                Ok(history)
            }
            Err(e) => {
                sink.error(&format!("❌ Agent run failed: {}", e));
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bench_core::Provider;

    use super::*;
    use crate::error::AgentError;
    use crate::history::AgentAction;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(LogLevel, String, Option<Value>)>>);

    impl LogSink for Recorder {
        fn emit(&self, level: LogLevel, message: &str, data: Option<Value>) {
            self.0
                .lock()
                .unwrap()
                .push((level, message.to_string(), data));
        }
    }

    struct Scripted {
        fail: bool,
    }

    #[async_trait]
    impl BrowserAgent for Scripted {
        async fn run(&self, _task: &str, _llm: &LlmClient, sink: &dyn LogSink) -> Result<AgentHistory> {
            sink.action("🖱️ Clicked element 3", None);
            sink.action("⌨️ Typed query", Some(serde_json::json!({ "text": "rust" })));
            if self.fail {
                return Err(AgentError::Timeout("page did not load".to_string()));
            }
            Ok(AgentHistory::new(vec![
                AgentAction::new("click"),
                AgentAction::new("done"),
            ]))
        }
    }

    fn llm() -> LlmClient {
        LlmClient {
            provider: Provider::OpenAi,
            model: "gpt-4o".to_string(),
            api_key: "sk".to_string(),
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn test_narrates_successful_run() {
        let sink = Recorder::default();
        let agent = LoggedAgent::new(Scripted { fail: false });
        let history = agent.run("Go to x and y", &llm(), &sink).await.unwrap();
        assert_eq!(history.len(), 2);

        let entries = sink.0.lock().unwrap();
        let levels: Vec<LogLevel> = entries.iter().map(|(l, _, _)| *l).collect();
        assert_eq!(
            levels,
            vec![LogLevel::Info, LogLevel::Action, LogLevel::Action, LogLevel::Success]
        );
        assert_eq!(entries[1].2, Some(serde_json::json!({ "step": 1 })));
        assert_eq!(
            entries[2].2,
            Some(serde_json::json!({ "step": 2, "text": "rust" }))
        );
    }

    #[tokio::test]
    async fn test_failure_is_logged_and_propagated() {
        let sink = Recorder::default();
        let agent = LoggedAgent::new(Scripted { fail: true });
        let err = agent.run("Go to x and y", &llm(), &sink).await.unwrap_err();
        assert!(err.to_string().contains("TimeoutError"));

        let entries = sink.0.lock().unwrap();
        let (level, message, _) = entries.last().unwrap();
        assert_eq!(*level, LogLevel::Error);
        assert!(message.contains("page did not load"));
    }
}
