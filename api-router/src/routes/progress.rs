use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
};
use futures::{Stream, StreamExt};
use tracing::debug;

use crate::api_state::ApiState;

/// Live progress for one job as Server-Sent-Events.
///
/// Each frame is `data: <json>` with an `event` discriminator inside the
/// JSON. The stream ends after a `done`, `error` or `timeout` event; a job
/// without a registered queue produces a single `error` frame.
pub async fn progress_stream(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!(job_id = %id, "progress stream attached");

    let frames = Arc::clone(&state.progress)
        .stream(id)
        .map(|frame| Ok(Event::default().data(frame)));

    Sse::new(frames).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
