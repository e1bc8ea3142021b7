use crate::AppState;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use futures::stream::{self, StreamExt};
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use sw_core::types::ProjectId;
use tokio_stream::wrappers::{BroadcastStream, IntervalStream};

/// Keeps idle connections alive through proxies that reap quiet streams.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

pub async fn subscribe(state: &AppState, project_id: &ProjectId) -> Response {
    let events = BroadcastStream::new(state.architect.review_stream(project_id)).filter_map(
        |item| async {
            match item {
                Ok(event) => {
                    let json = serde_json::to_string(&event).unwrap_or_else(|_| "{}".to_string());
                    Some(Ok::<Event, Infallible>(Event::default().data(json)))
                }
                // Lagged receivers just skip ahead.
                Err(_) => None,
            }
        },
    );

    let heartbeats = IntervalStream::new(tokio::time::interval(HEARTBEAT_INTERVAL)).map(|_| {
        let payload = json!({
            "type": "heartbeat",
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        Ok::<Event, Infallible>(Event::default().data(payload.to_string()))
    });

    Sse::new(stream::select(events, heartbeats)).into_response()
}
