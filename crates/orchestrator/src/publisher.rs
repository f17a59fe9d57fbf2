use std::collections::VecDeque;
use std::time::Duration;

use bench_core::{CompletionSummary, SessionSnapshot, StreamUpdate};
use futures::Stream;
use tracing::{debug, info};

use crate::registry::SessionRegistry;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_CLEANUP_GRACE: Duration = Duration::from_secs(60);

/// Timing of a session stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublisherConfig {
    pub poll_interval: Duration,
    /// Delay between announcing completion and dropping the session.
    pub cleanup_grace: Duration,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            cleanup_grace: DEFAULT_CLEANUP_GRACE,
        }
    }
}

/// Turns registry state into a stream of [`StreamUpdate`]s by polling.
#[derive(Clone)]
pub struct StreamPublisher {
    registry: SessionRegistry,
    config: PublisherConfig,
}

struct Cursor {
    registry: SessionRegistry,
    config: PublisherConfig,
    session_id: String,
    sent_logs: usize,
    polls: u64,
    pending: VecDeque<StreamUpdate>,
    closed: bool,
}

impl Cursor {
    fn poll_once(&mut self) {
        let Some(progress) = self.registry.progress_since(&self.session_id, self.sent_logs) else {
            self.close_with_error();
            return;
        };

        self.sent_logs += progress.logs.len();
        self.pending
            .extend(progress.logs.into_iter().map(StreamUpdate::Log));
        self.pending.push_back(StreamUpdate::Status {
            status: progress.status,
        });

        if progress.status.is_terminal() {
            match self.registry.get(&self.session_id) {
                Some(snapshot) => {
                    self.pending
                        .push_back(StreamUpdate::Completion(completion_summary(&snapshot)));
                    self.schedule_cleanup();
                    self.closed = true;
                }
                None => self.close_with_error(),
            }
        }
    }

    fn close_with_error(&mut self) {
        debug!(session_id = %self.session_id, "Stream requested for unknown session");
        self.pending.push_back(StreamUpdate::Error {
            message: "Session not found".to_string(),
        });
        self.closed = true;
    }

    fn schedule_cleanup(&self) {
        if !self.registry.try_schedule_cleanup(&self.session_id) {
            return;
        }

        let registry = self.registry.clone();
        let session_id = self.session_id.clone();
        let grace = self.config.cleanup_grace;
        info!(session_id = %session_id, grace_secs = grace.as_secs(), "Session cleanup scheduled");
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if registry.delete(&session_id) {
                debug!(session_id = %session_id, "Session cleaned up");
            }
        });
    }
}

/// Rollup announced with the terminal `completion` event.
pub fn completion_summary(snapshot: &SessionSnapshot) -> CompletionSummary {
    CompletionSummary {
        status: snapshot.status,
        success: snapshot.status == bench_core::SessionStatus::Completed,
        total_models: snapshot.rollup.total_models,
        completed_models: snapshot.rollup.completed_models,
        successful_models: snapshot.rollup.successful_models,
        model_results: snapshot
            .model_results
            .iter()
            .map(|r| (r.model_id.clone(), r.clone()))
            .collect(),
        error_message: snapshot.error_message.clone(),
    }
}

impl StreamPublisher {
    pub fn new(registry: SessionRegistry, config: PublisherConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> PublisherConfig {
        self.config
    }

    /// Stream updates of one session until it completes or disappears.
    ///
    /// The first poll happens immediately. Dropping the stream has no effect
    /// on the session.
    pub fn subscribe(&self, session_id: &str) -> impl Stream<Item = StreamUpdate> + Send + 'static {
        let cursor = Cursor {
            registry: self.registry.clone(),
            config: self.config,
            session_id: session_id.to_string(),
            sent_logs: 0,
            polls: 0,
            pending: VecDeque::new(),
            closed: false,
        };

        futures::stream::unfold(cursor, |mut cursor| async move {
            loop {
                if let Some(update) = cursor.pending.pop_front() {
                    return Some((update, cursor));
                }
                if cursor.closed {
                    return None;
                }
                if cursor.polls > 0 {
                    tokio::time::sleep(cursor.config.poll_interval).await;
                }
                cursor.polls += 1;
                cursor.poll_once();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use bench_core::{BenchmarkRequest, LogLevel, ModelDescriptor, ModelResult, SessionStatus};
    use chrono::Utc;
    use futures::StreamExt;

    use super::*;
    use crate::registry::SessionUpdate;

    fn request() -> BenchmarkRequest {
        BenchmarkRequest::new("user-1", "https://example.com", "find the pricing page")
    }

    fn publisher(registry: &SessionRegistry) -> StreamPublisher {
        StreamPublisher::new(registry.clone(), PublisherConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_session_yields_single_error() {
        let registry = SessionRegistry::new();
        let updates: Vec<StreamUpdate> = publisher(&registry).subscribe("missing").collect().await;
        assert_eq!(
            updates,
            vec![StreamUpdate::Error {
                message: "Session not found".to_string()
            }]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_logs_arrive_complete_and_in_order() {
        let registry = SessionRegistry::new();
        registry.create("s-1", request());
        registry.update("s-1", SessionUpdate::status(SessionStatus::Running));

        let producer = registry.clone();
        tokio::spawn(async move {
            for i in 0..100 {
                producer.emit("s-1", None, LogLevel::Info, &format!("entry {}", i), None);
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            producer.update("s-1", SessionUpdate::status(SessionStatus::Completed));
        });

        let updates: Vec<StreamUpdate> = publisher(&registry).subscribe("s-1").collect().await;
        let messages: Vec<String> = updates
            .iter()
            .filter_map(|u| match u {
                StreamUpdate::Log(entry) => Some(entry.message.clone()),
                _ => None,
            })
            .collect();
        let expected: Vec<String> = (0..100).map(|i| format!("entry {}", i)).collect();
        assert_eq!(messages, expected);
        assert!(matches!(updates.last(), Some(StreamUpdate::Completion(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_observed_status_never_goes_backwards() {
        let registry = SessionRegistry::new();
        registry.create("s-1", request());

        let driver = registry.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            driver.update("s-1", SessionUpdate::status(SessionStatus::Running));
            tokio::time::sleep(Duration::from_millis(1500)).await;
            driver.update("s-1", SessionUpdate::status(SessionStatus::Starting));
            tokio::time::sleep(Duration::from_millis(1500)).await;
            driver.update("s-1", SessionUpdate::status(SessionStatus::Failed));
        });

        let statuses: Vec<SessionStatus> = publisher(&registry)
            .subscribe("s-1")
            .filter_map(|u| async move {
                match u {
                    StreamUpdate::Status { status } => Some(status),
                    _ => None,
                }
            })
            .collect()
            .await;

        assert_eq!(statuses.first(), Some(&SessionStatus::Starting));
        assert_eq!(statuses.last(), Some(&SessionStatus::Failed));
        for pair in statuses.windows(2) {
            assert!(pair[0].can_advance_to(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_carries_rollup_and_results() {
        let registry = SessionRegistry::new();
        registry.create("s-1", request());
        let a = ModelDescriptor::new("a", "A", "openai", "gpt-4o");
        let b = ModelDescriptor::new("b", "B", "anthropic", "claude-3-haiku-20240307");
        let results = vec![
            ModelResult::failed(&a, Utc::now(), "TimeoutError: slow"),
            ModelResult::completed(&b, Utc::now(), Some("OK".to_string())),
        ];
        for result in &results {
            registry.update("s-1", SessionUpdate::result(result.clone()));
        }
        registry.update(
            "s-1",
            SessionUpdate::status(SessionStatus::Completed)
                .with_rollup(bench_core::SessionRollup::from_results(2, &results)),
        );

        let updates: Vec<StreamUpdate> = publisher(&registry).subscribe("s-1").collect().await;
        let Some(StreamUpdate::Completion(summary)) = updates.last() else {
            panic!("expected completion, got {:?}", updates.last());
        };
        assert!(summary.success);
        assert_eq!(summary.total_models, 2);
        assert_eq!(summary.completed_models, 2);
        assert_eq!(summary.successful_models, 1);
        assert_eq!(summary.model_results["b"].final_result.as_deref(), Some("OK"));
        assert!(!summary.model_results["a"].success);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_fires_once_then_reconnect_errors() {
        let registry = SessionRegistry::new();
        registry.create("s-1", request());
        registry.update("s-1", SessionUpdate::status(SessionStatus::Completed));
        let publisher = publisher(&registry);

        // two racing consumers both see the completion
        let (first, second) = tokio::join!(
            publisher.subscribe("s-1").collect::<Vec<_>>(),
            publisher.subscribe("s-1").collect::<Vec<_>>()
        );
        assert!(matches!(first.last(), Some(StreamUpdate::Completion(_))));
        assert!(matches!(second.last(), Some(StreamUpdate::Completion(_))));
        assert!(!registry.try_schedule_cleanup("s-1"));

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert!(registry.contains("s-1"));
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!registry.contains("s-1"));

        let updates: Vec<StreamUpdate> = publisher.subscribe("s-1").collect().await;
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].event_type(), "error");
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_deleted_mid_stream() {
        let registry = SessionRegistry::new();
        registry.create("s-1", request());

        let deleter = registry.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(2500)).await;
            deleter.delete("s-1");
        });

        let updates: Vec<StreamUpdate> = publisher(&registry).subscribe("s-1").collect().await;
        assert!(updates.len() >= 2);
        assert!(matches!(updates[0], StreamUpdate::Status { .. }));
        assert_eq!(updates.last().map(StreamUpdate::event_type), Some("error"));
    }
}
