use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{BenchmarkOutcome, NewBenchmark, SessionSummary};
use crate::store::BenchmarkStore;

const BENCHMARKS_TABLE: &str = "benchmarks";
const SESSIONS_TABLE: &str = "benchmark_sessions";
const SCREENSHOT_BUCKET: &str = "benchmark-screenshots";

/// Network store speaking the PostgREST dialect (Supabase `rest/v1`).
#[derive(Clone)]
pub struct RestStore {
    base_url: String,
    service_key: String,
    client: Client,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self::with_client(base_url, service_key, Client::new())
    }

    pub fn with_client(
        base_url: impl Into<String>,
        service_key: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            service_key: service_key.into(),
            client,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn object_path(file_name: &str) -> String {
        format!("{}/{}", SCREENSHOT_BUCKET, file_name)
    }

    fn headers(&self, prefer: &'static str) -> HeaderMap {
        let mut headers = self.auth_headers();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("Prefer", HeaderValue::from_static(prefer));
        headers
    }

    fn auth_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(key) = HeaderValue::from_str(&self.service_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.service_key)) {
            headers.insert(AUTHORIZATION, bearer);
        }
        headers
    }

    async fn check(table: &str, response: reqwest::Response) -> Result<(), DbError> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(DbError::Rejected {
            table: table.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl BenchmarkStore for RestStore {
    async fn insert_benchmark(&self, benchmark: &NewBenchmark) -> Result<Uuid, DbError> {
        let response = self
            .client
            .post(self.table_url(BENCHMARKS_TABLE))
            .headers(self.headers("return=minimal"))
            .json(benchmark)
            .send()
            .await?;

        Self::check(BENCHMARKS_TABLE, response).await?;
        debug!(id = %benchmark.id, model = %benchmark.model, "Benchmark row inserted");
        Ok(benchmark.id)
    }

    async fn complete_benchmark(
        &self,
        id: Uuid,
        outcome: &BenchmarkOutcome,
    ) -> Result<(), DbError> {
        let response = self
            .client
            .patch(self.table_url(BENCHMARKS_TABLE))
            .query(&[("id", format!("eq.{}", id))])
            .headers(self.headers("return=minimal"))
            .json(outcome)
            .send()
            .await?;

        Self::check(BENCHMARKS_TABLE, response).await
    }

    async fn upsert_session(&self, summary: &SessionSummary) -> Result<(), DbError> {
        let response = self
            .client
            .post(self.table_url(SESSIONS_TABLE))
            .query(&[("on_conflict", "session_id")])
            .headers(self.headers("resolution=merge-duplicates,return=minimal"))
            .json(summary)
            .send()
            .await?;

        Self::check(SESSIONS_TABLE, response).await
    }

    async fn upload_screenshot(&self, png: &[u8]) -> Result<Option<String>, DbError> {
        let object = Self::object_path(&format!("screenshots/{}.png", Uuid::new_v4()));
        let response = self
            .client
            .post(format!("{}/storage/v1/object/{}", self.base_url, object))
            .headers(self.auth_headers())
            .header(CONTENT_TYPE, "image/png")
            .body(png.to_vec())
            .send()
            .await?;

        Self::check(SCREENSHOT_BUCKET, response).await?;
        let url = format!("{}/storage/v1/object/public/{}", self.base_url, object);
        debug!(url = %url, bytes = png.len(), "Screenshot uploaded");
        Ok(Some(url))
    }

    fn backend_name(&self) -> &'static str {
        "supabase"
    }
}
