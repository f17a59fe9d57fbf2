use crate::error::DbError;
use crate::models::{datetime_to_timestamp, SessionSummary, SessionSummaryRow};
use sqlx::SqlitePool;

#[derive(Clone)]
pub struct SessionSummaryRepository {
    pool: SqlitePool,
}

impl SessionSummaryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn upsert(&self, summary: &SessionSummary) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO benchmark_sessions (session_id, user_id, website_url, task_description, status, total_models, completed_models, successful_models, error_message, completed_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                status = excluded.status,
                total_models = excluded.total_models,
                completed_models = excluded.completed_models,
                successful_models = excluded.successful_models,
                error_message = excluded.error_message,
                completed_at = excluded.completed_at
            "#,
        )
        .bind(&summary.session_id)
        .bind(&summary.user_id)
        .bind(&summary.website_url)
        .bind(&summary.task_description)
        .bind(summary.status.as_str())
        .bind(summary.total_models as i64)
        .bind(summary.completed_models as i64)
        .bind(summary.successful_models as i64)
        .bind(&summary.error_message)
        .bind(datetime_to_timestamp(summary.completed_at))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_session_id(
        &self,
        session_id: &str,
    ) -> Result<Option<SessionSummary>, DbError> {
        let row: Option<SessionSummaryRow> = sqlx::query_as(
            r#"
            SELECT session_id, user_id, website_url, task_description, status, total_models,
                   completed_models, successful_models, error_message, completed_at
            FROM benchmark_sessions
            WHERE session_id = ?
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_domain()))
    }
}
