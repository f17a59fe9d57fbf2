use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use bench_core::StreamUpdate;
use futures::stream::{Stream, StreamExt};
use tracing::debug;

use crate::state::AppState;

pub const SSE_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// One `data:` frame per update. The event name stays unset so plain
/// `EventSource.onmessage` handlers receive every update.
fn update_to_sse_event(update: &StreamUpdate) -> Result<Event, Infallible> {
    let data = serde_json::to_string(update).unwrap_or_else(|_| {
        r#"{"type":"error","data":{"message":"serialization_failed"}}"#.to_string()
    });
    Ok(Event::default().data(data))
}

#[utoipa::path(
    get,
    path = "/api/benchmark/stream/{session_id}",
    params(
        ("session_id" = String, Path, description = "Session ID passed to the start call"),
    ),
    responses(
        (status = 200, description = "SSE stream of log, status, completion and error updates", content_type = "text/event-stream", body = StreamUpdate),
    ),
    tag = "benchmark"
)]
pub async fn benchmark_stream(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!(session_id = %session_id, "Benchmark stream opened");

    let stream = state
        .publisher
        .subscribe(&session_id)
        .map(|update| update_to_sse_event(&update));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(SSE_KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}
