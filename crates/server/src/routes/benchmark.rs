use axum::extract::{Path, State};
use axum::Json;
use bench_core::{BenchmarkRequest, SessionSnapshot};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StartBenchmarkRequest {
    /// Caller-chosen id, later used to open the stream.
    pub session_id: String,
    pub user_id: String,
    pub website_url: String,
    pub task_description: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct StartBenchmarkResponse {
    pub success: bool,
    pub session_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionListResponse {
    pub sessions: Vec<String>,
}

#[utoipa::path(
    post,
    path = "/api/benchmark/start",
    request_body = StartBenchmarkRequest,
    responses(
        (status = 200, description = "Session accepted and running in the background", body = StartBenchmarkResponse),
        (status = 400, description = "Missing or blank field", body = ErrorResponse),
        (status = 409, description = "Session id is still live", body = ErrorResponse)
    ),
    tag = "benchmark"
)]
pub async fn start_benchmark(
    State(state): State<AppState>,
    Json(payload): Json<StartBenchmarkRequest>,
) -> Result<Json<StartBenchmarkResponse>, AppError> {
    if payload.session_id.trim().is_empty() {
        return Err(AppError::BadRequest(
            "session_id must not be empty".to_string(),
        ));
    }

    let request = BenchmarkRequest::new(
        payload.user_id,
        payload.website_url,
        payload.task_description,
    );
    state.orchestrator.start(&payload.session_id, request)?;

    Ok(Json(StartBenchmarkResponse {
        success: true,
        session_id: payload.session_id,
    }))
}

#[utoipa::path(
    get,
    path = "/api/benchmark/sessions",
    responses(
        (status = 200, description = "Ids of live sessions", body = SessionListResponse)
    ),
    tag = "benchmark"
)]
pub async fn list_benchmark_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    Json(SessionListResponse {
        sessions: state.registry.list_ids(),
    })
}

#[utoipa::path(
    get,
    path = "/api/benchmark/sessions/{session_id}",
    params(
        ("session_id" = String, Path, description = "Session ID")
    ),
    responses(
        (status = 200, description = "Current session state", body = SessionSnapshot),
        (status = 404, description = "Session not found", body = ErrorResponse)
    ),
    tag = "benchmark"
)]
pub async fn get_benchmark_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    state
        .registry
        .get(&session_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {}", session_id)))
}
