//! Server-Sent Events stream of dashboard snapshots.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tracing::debug;

use primerwatch_client::DashboardPoller;

use crate::auth::ApiSession;
use crate::state::SharedState;

/// `GET /api/dashboard/events`: one `snapshot` event per poll.
///
/// Each connection owns its poller; the handle lives inside the stream, so
/// the poll task is cancelled when the client goes away.
pub async fn dashboard_events(
    State(state): State<SharedState>,
    ApiSession(session): ApiSession,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let interval = state.config.dashboard.poll_interval();
    let handle = DashboardPoller::spawn(state.backend.clone(), session, interval);
    debug!(?interval, "dashboard event stream opened");

    let stream = WatchStream::new(handle.subscribe()).filter_map(move |snapshot| {
        let _poller = &handle;
        snapshot
            .and_then(|snap| serde_json::to_string(&snap).ok())
            .map(|data| Ok(Event::default().event("snapshot").data(data)))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
