use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store rejected write to {table}: status {status}: {body}")]
    Rejected {
        table: String,
        status: u16,
        body: String,
    },

    #[error("Benchmark not found: {0}")]
    BenchmarkNotFound(String),
}
