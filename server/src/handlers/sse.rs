use bytes::Bytes;
use futures_util::StreamExt;
use http_body_util::{BodyExt, StreamBody, combinators::BoxBody};
use hyper::{Request, Response, StatusCode, body::Frame, header::HeaderValue};
use serde::Serialize;
use shared::types::sse::message;
use std::convert::Infallible;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::AppState;
use shared::types::sse::{SseError, SseResult};

// ---------------------------------------------------------------------------
// Wire framing
// ---------------------------------------------------------------------------

/// Helpers for formatting SSE wire frames
pub struct SseStreamBuilder;

impl SseStreamBuilder {
    /// Standard SSE response headers
    pub fn response_headers() -> (HeaderValue, HeaderValue) {
        (
            HeaderValue::from_static("text/event-stream"),
            HeaderValue::from_static("no-cache"),
        )
    }

    /// Serialise a named message into the SSE wire format
    pub fn format_frame<T: Serialize>(event_type: &str, data: &T) -> String {
        let data = serde_json::to_string(data).unwrap_or_else(|_| "null".to_string());
        format!(
            "event: {}\ndata: {}\nid: {}\n\n",
            event_type,
            data,
            Uuid::new_v4()
        )
    }
}

// ---------------------------------------------------------------------------
// SSE subscribe handler
// ---------------------------------------------------------------------------

/// Send the bootstrap snapshot, then stream live changes.
///
/// ### Event sequence emitted
/// ```text
/// event: initial-events   — full store snapshot (active and inactive)
/// event: event-change     — one per generated operation
/// event: reconnect        — subscriber lagged; should reconnect
/// ```
///
/// The bootstrap snapshot is captured *before* subscribing would matter:
/// the receiver is taken first, so a change broadcast between snapshot
/// and first recv is delivered rather than lost.
pub async fn handle_stream(
    _req: Request<hyper::body::Incoming>,
    state: AppState,
) -> SseResult<Response<BoxBody<Bytes, Infallible>>> {
    let mut rx = state.changes.subscribe();
    let snapshot = state.store.all().await;

    info!(
        "SSE subscriber connected ({} events in bootstrap, {} subscribers total)",
        snapshot.len(),
        state.changes.receiver_count()
    );

    let (content_type, cache_control) = SseStreamBuilder::response_headers();

    let stream = async_stream::stream! {
        yield Ok::<Bytes, Infallible>(Bytes::from(SseStreamBuilder::format_frame(
            message::INITIAL_EVENTS,
            &snapshot,
        )));

        loop {
            match rx.recv().await {
                Ok(change) => {
                    let frame = SseStreamBuilder::format_frame(message::EVENT_CHANGE, &change);
                    yield Ok::<Bytes, Infallible>(Bytes::from(frame));
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("SSE subscriber lagged by {} messages, sending reconnect hint", n);
                    let frame = SseStreamBuilder::format_frame(
                        message::RECONNECT,
                        &serde_json::json!({ "reason": "lagged", "missed": n }),
                    );
                    yield Ok::<Bytes, Infallible>(Bytes::from(frame));
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("SSE broadcast channel closed");
                    break;
                }
            }
        }
    };

    let body = BodyExt::boxed(StreamBody::new(
        stream.map(|result| result.map(Frame::data)),
    ));

    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", content_type)
        .header("cache-control", cache_control)
        .header("connection", "keep-alive")
        .header("x-accel-buffering", "no")
        .header("access-control-allow-origin", "*")
        .body(body)
        .map_err(|e| {
            error!("Failed to build SSE response: {}", e);
            SseError::ChannelSendFailed("Failed to build SSE response".to_string())
        })
}
