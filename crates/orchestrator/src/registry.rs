use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bench_core::{
    BenchmarkRequest, LogEntry, LogLevel, ModelResult, SessionRollup, SessionSnapshot,
    SessionStatus,
};
use browser_agent::LogSink;
use chrono::Utc;
use tracing::{debug, warn};

use crate::error::{OrchestratorError, Result};

/// Partial update merged into a live session by [`SessionRegistry::update`].
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    pub status: Option<SessionStatus>,
    pub rollup: Option<SessionRollup>,
    /// Replaces any earlier result for the same model id.
    pub result: Option<ModelResult>,
    pub error_message: Option<String>,
}

impl SessionUpdate {
    pub fn status(status: SessionStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn result(result: ModelResult) -> Self {
        Self {
            result: Some(result),
            ..Default::default()
        }
    }

    pub fn with_rollup(mut self, rollup: SessionRollup) -> Self {
        self.rollup = Some(rollup);
        self
    }

    pub fn with_error(mut self, error_message: Option<String>) -> Self {
        self.error_message = error_message;
        self
    }
}

/// Logs appended after a cursor together with the status at the same instant.
#[derive(Debug, Clone)]
pub struct SessionProgress {
    pub logs: Vec<LogEntry>,
    pub status: SessionStatus,
}

struct SessionState {
    snapshot: SessionSnapshot,
    has_new_data: bool,
    cleanup_scheduled: bool,
}

/// Process-wide table of in-flight benchmark sessions.
///
/// Cheap to clone; every clone shares the same table. Each method takes the
/// lock for one map operation only, so callers never hold it across an await.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, SessionState>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, SessionState>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, SessionState>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn new_state(session_id: &str, request: BenchmarkRequest) -> SessionState {
        SessionState {
            snapshot: SessionSnapshot {
                session_id: session_id.to_string(),
                status: SessionStatus::Starting,
                request,
                logs: Vec::new(),
                model_results: Vec::new(),
                rollup: SessionRollup::default(),
                error_message: None,
                created_at: Utc::now(),
            },
            has_new_data: false,
            cleanup_scheduled: false,
        }
    }

    /// Insert a fresh `starting` session, replacing any session with this id.
    pub fn create(&self, session_id: &str, request: BenchmarkRequest) {
        let previous = self
            .write()
            .insert(session_id.to_string(), Self::new_state(session_id, request));
        if previous.is_some() {
            warn!(session_id = %session_id, "Session id reused, previous session replaced");
        }
    }

    /// Like [`create`](Self::create) but refuses to replace a live session.
    pub fn try_create(&self, session_id: &str, request: BenchmarkRequest) -> Result<()> {
        let mut sessions = self.write();
        if sessions.contains_key(session_id) {
            return Err(OrchestratorError::SessionExists(session_id.to_string()));
        }
        sessions.insert(session_id.to_string(), Self::new_state(session_id, request));
        Ok(())
    }

    pub fn get(&self, session_id: &str) -> Option<SessionSnapshot> {
        self.read().get(session_id).map(|s| s.snapshot.clone())
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.read().contains_key(session_id)
    }

    pub fn status(&self, session_id: &str) -> Option<SessionStatus> {
        self.read().get(session_id).map(|s| s.snapshot.status)
    }

    /// Merge `update` into the session. Returns `false` if it does not exist.
    ///
    /// A status that would move the session backwards is dropped; the rest
    /// of the update still applies.
    pub fn update(&self, session_id: &str, update: SessionUpdate) -> bool {
        let mut sessions = self.write();
        let Some(state) = sessions.get_mut(session_id) else {
            return false;
        };
        let snapshot = &mut state.snapshot;

        if let Some(next) = update.status {
            match snapshot.status.advance(next) {
                Ok(status) => snapshot.status = status,
                Err(e) => warn!(session_id = %session_id, error = %e, "Ignoring status update"),
            }
        }
        if let Some(rollup) = update.rollup {
            snapshot.rollup = rollup;
        }
        if let Some(result) = update.result {
            match snapshot
                .model_results
                .iter_mut()
                .find(|r| r.model_id == result.model_id)
            {
                Some(existing) => *existing = result,
                None => snapshot.model_results.push(result),
            }
        }
        if update.error_message.is_some() {
            snapshot.error_message = update.error_message;
        }
        state.has_new_data = true;
        true
    }

    pub fn delete(&self, session_id: &str) -> bool {
        self.write().remove(session_id).is_some()
    }

    /// Append a log entry to the session. Unknown sessions are ignored.
    pub fn emit(
        &self,
        session_id: &str,
        model_id: Option<&str>,
        level: LogLevel,
        message: &str,
        data: Option<serde_json::Value>,
    ) {
        let mut sessions = self.write();
        let Some(state) = sessions.get_mut(session_id) else {
            return;
        };

        debug!(
            session_id = %session_id,
            model_id = model_id.unwrap_or("-"),
            level = level.as_str(),
            "{}",
            message
        );
        state
            .snapshot
            .logs
            .push(LogEntry::new(level, message).with_model(model_id).with_data(data));
        state.has_new_data = true;
    }

    /// Sink bound to one session, and optionally one model of it.
    pub fn sink(&self, session_id: &str, model_id: Option<&str>) -> SessionSink {
        SessionSink {
            registry: self.clone(),
            session_id: session_id.to_string(),
            model_id: model_id.map(str::to_string),
        }
    }

    pub fn log_count(&self, session_id: &str) -> Option<usize> {
        self.read().get(session_id).map(|s| s.snapshot.logs.len())
    }

    /// Entries at positions `cursor..`. A cursor past the end yields nothing.
    pub fn logs_since(&self, session_id: &str, cursor: usize) -> Option<Vec<LogEntry>> {
        self.read()
            .get(session_id)
            .map(|s| s.snapshot.logs.get(cursor..).unwrap_or_default().to_vec())
    }

    /// New logs and the current status read under a single lock, clearing the
    /// new-data flag.
    pub fn progress_since(&self, session_id: &str, cursor: usize) -> Option<SessionProgress> {
        let mut sessions = self.write();
        let state = sessions.get_mut(session_id)?;
        state.has_new_data = false;
        Some(SessionProgress {
            logs: state
                .snapshot
                .logs
                .get(cursor..)
                .unwrap_or_default()
                .to_vec(),
            status: state.snapshot.status,
        })
    }

    /// Read and clear the new-data flag.
    pub fn take_new_data(&self, session_id: &str) -> Option<bool> {
        let mut sessions = self.write();
        let state = sessions.get_mut(session_id)?;
        Some(std::mem::replace(&mut state.has_new_data, false))
    }

    /// Mark the session for cleanup. Only the first caller gets `true`.
    pub fn try_schedule_cleanup(&self, session_id: &str) -> bool {
        let mut sessions = self.write();
        match sessions.get_mut(session_id) {
            Some(state) if !state.cleanup_scheduled => {
                state.cleanup_scheduled = true;
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.read().keys().cloned().collect();
        ids.sort();
        ids
    }
}

/// [`LogSink`] that appends to a session in the registry.
#[derive(Clone)]
pub struct SessionSink {
    registry: SessionRegistry,
    session_id: String,
    model_id: Option<String>,
}

impl SessionSink {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl LogSink for SessionSink {
    fn emit(&self, level: LogLevel, message: &str, data: Option<serde_json::Value>) {
        self.registry
            .emit(&self.session_id, self.model_id.as_deref(), level, message, data);
    }
}
