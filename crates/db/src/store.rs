use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{BenchmarkOutcome, NewBenchmark, SessionSummary};
use crate::repositories::{BenchmarkRepository, SessionSummaryRepository};

/// Write side of benchmark persistence.
///
/// Callers treat every method as best effort: a failure is logged and the
/// benchmark carries on.
#[async_trait]
pub trait BenchmarkStore: Send + Sync {
    /// Insert a `running` row for one model and return its id.
    async fn insert_benchmark(&self, benchmark: &NewBenchmark) -> Result<Uuid, DbError>;

    /// Patch the terminal outcome onto a previously inserted row.
    async fn complete_benchmark(&self, id: Uuid, outcome: &BenchmarkOutcome)
        -> Result<(), DbError>;

    /// Insert or replace the rollup row of a session.
    async fn upsert_session(&self, summary: &SessionSummary) -> Result<(), DbError>;

    /// Store a final-page PNG and return its public URL. Backends without
    /// object storage keep nothing and return `None`.
    async fn upload_screenshot(&self, _png: &[u8]) -> Result<Option<String>, DbError> {
        Ok(None)
    }

    fn backend_name(&self) -> &'static str;
}

/// Discards every write. Used when no storage is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

#[async_trait]
impl BenchmarkStore for NoopStore {
    async fn insert_benchmark(&self, benchmark: &NewBenchmark) -> Result<Uuid, DbError> {
        Ok(benchmark.id)
    }

    async fn complete_benchmark(
        &self,
        _id: Uuid,
        _outcome: &BenchmarkOutcome,
    ) -> Result<(), DbError> {
        Ok(())
    }

    async fn upsert_session(&self, _summary: &SessionSummary) -> Result<(), DbError> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "none"
    }
}

/// Local SQLite backend.
#[derive(Clone)]
pub struct SqliteStore {
    benchmarks: BenchmarkRepository,
    sessions: SessionSummaryRepository,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            benchmarks: BenchmarkRepository::new(pool.clone()),
            sessions: SessionSummaryRepository::new(pool),
        }
    }

    pub fn benchmarks(&self) -> &BenchmarkRepository {
        &self.benchmarks
    }

    pub fn sessions(&self) -> &SessionSummaryRepository {
        &self.sessions
    }
}

/// Screenshots are not kept locally; only the URL column exists.
#[async_trait]
impl BenchmarkStore for SqliteStore {
    async fn insert_benchmark(&self, benchmark: &NewBenchmark) -> Result<Uuid, DbError> {
        self.benchmarks.create(benchmark).await
    }

    async fn complete_benchmark(
        &self,
        id: Uuid,
        outcome: &BenchmarkOutcome,
    ) -> Result<(), DbError> {
        self.benchmarks.complete(id, outcome).await
    }

    async fn upsert_session(&self, summary: &SessionSummary) -> Result<(), DbError> {
        self.sessions.upsert(summary).await
    }

    fn backend_name(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_store_skips_screenshots() {
        let url = NoopStore.upload_screenshot(b"\x89PNG").await.unwrap();
        assert!(url.is_none());
    }
}
