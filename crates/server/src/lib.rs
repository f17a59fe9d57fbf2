pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Website Benchmark API",
        version = "0.1.0",
        description = "Runs one browser task across several language models and streams progress"
    ),
    paths(
        routes::health_check,
        routes::supported_models,
        routes::start_benchmark,
        routes::list_benchmark_sessions,
        routes::get_benchmark_session,
        routes::sse::benchmark_stream,
    ),
    components(schemas(
        routes::HealthResponse,
        routes::SupportedModelsResponse,
        routes::StartBenchmarkRequest,
        routes::StartBenchmarkResponse,
        routes::SessionListResponse,
        error::ErrorResponse,
        bench_core::BenchmarkRequest,
        bench_core::CompletionSummary,
        bench_core::LogEntry,
        bench_core::LogLevel,
        bench_core::ModelDescriptor,
        bench_core::ModelResult,
        bench_core::ModelStatus,
        bench_core::Provider,
        bench_core::ProviderCatalogue,
        bench_core::SessionRollup,
        bench_core::SessionSnapshot,
        bench_core::SessionStatus,
        bench_core::StreamUpdate,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "models", description = "Model catalogue endpoints"),
        (name = "benchmark", description = "Benchmark sessions and their event streams (SSE)"),
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(routes::health_check))
        .route("/api/supported-models", get(routes::supported_models))
        .route("/api/benchmark/start", post(routes::start_benchmark))
        .route(
            "/api/benchmark/stream/{session_id}",
            get(routes::sse::benchmark_stream),
        )
        .route(
            "/api/benchmark/sessions",
            get(routes::list_benchmark_sessions),
        )
        .route(
            "/api/benchmark/sessions/{session_id}",
            get(routes::get_benchmark_session),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
