use crate::error::DbError;
use crate::models::{datetime_to_timestamp, Benchmark, BenchmarkOutcome, BenchmarkRow, NewBenchmark};
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Clone)]
pub struct BenchmarkRepository {
    pool: SqlitePool,
}

impl BenchmarkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, benchmark: &NewBenchmark) -> Result<Uuid, DbError> {
        sqlx::query(
            r#"
            INSERT INTO benchmarks (id, session_id, user_id, website_url, task_description, llm_provider, model, model_name, status, started_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(benchmark.id.to_string())
        .bind(&benchmark.session_id)
        .bind(&benchmark.user_id)
        .bind(&benchmark.website_url)
        .bind(&benchmark.task_description)
        .bind(&benchmark.llm_provider)
        .bind(&benchmark.model)
        .bind(&benchmark.model_name)
        .bind(benchmark.status.as_str())
        .bind(datetime_to_timestamp(benchmark.started_at))
        .execute(&self.pool)
        .await?;

        Ok(benchmark.id)
    }

    pub async fn complete(&self, id: Uuid, outcome: &BenchmarkOutcome) -> Result<(), DbError> {
        let agent_steps = serde_json::to_string(&outcome.agent_steps)?;
        let browser_logs = serde_json::to_string(&outcome.browser_logs)?;

        let result = sqlx::query(
            r#"
            UPDATE benchmarks
            SET status = ?, success = ?, execution_time_ms = ?, error_message = ?, final_result = ?, agent_steps = ?,
                browser_logs = ?, screenshot_url = ?, completed_at = ?
            WHERE id = ?
            "#,
        )
        .bind(outcome.status.as_str())
        .bind(outcome.success)
        .bind(outcome.execution_time_ms as i64)
        .bind(&outcome.error_message)
        .bind(&outcome.final_result)
        .bind(&agent_steps)
        .bind(&browser_logs)
        .bind(&outcome.screenshot_url)
        .bind(datetime_to_timestamp(outcome.completed_at))
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::BenchmarkNotFound(id.to_string()));
        }

        Ok(())
    }

    pub async fn find_by_session_id(&self, session_id: &str) -> Result<Vec<Benchmark>, DbError> {
        let rows: Vec<BenchmarkRow> = sqlx::query_as(
            r#"
            SELECT id, session_id, user_id, website_url, task_description, llm_provider, model, model_name,
                   status, success, execution_time_ms, error_message, final_result, agent_steps, browser_logs,
                   screenshot_url, started_at, completed_at
            FROM benchmarks
            WHERE session_id = ?
            ORDER BY started_at ASC, rowid ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }
}
