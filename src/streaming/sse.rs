//! SSE framing and the streaming-response header contract.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::Response,
};
use bytes::Bytes;
use chat_protocol::StreamEvent;
use futures::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::error;

/// Marker header telling the AI SDK client this is a UI message stream.
const UI_MESSAGE_STREAM_HEADER: &str = "x-vercel-ai-ui-message-stream";

/// Serialize one event as an SSE frame: `data: <compact json>\n\n`.
pub fn format_event(event: &StreamEvent) -> String {
    match serde_json::to_string(event) {
        Ok(json) => format!("data: {json}\n\n"),
        Err(err) => {
            error!("failed to encode stream event: {}", err);
            String::new()
        }
    }
}

/// Wrap the event channel into the streaming HTTP response.
pub fn sse_response(events: ReceiverStream<StreamEvent>) -> Response {
    let body = Body::from_stream(
        events.map(|event| Ok::<_, std::convert::Infallible>(Bytes::from(format_event(&event)))),
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(UI_MESSAGE_STREAM_HEADER, "v1")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .header("X-Accel-Buffering", "no")
        .body(body)
        .unwrap_or_else(|err| {
            error!("failed to build streaming response: {}", err);
            Response::new(Body::empty())
        })
}
