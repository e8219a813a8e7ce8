//! Streaming response pass-through (SSE)

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use futures::StreamExt;

/// Relay an accepted upstream response as a live event stream.
///
/// Headers are set before any body bytes are written; after that point the
/// status is committed. Chunks are copied to the caller exactly as received,
/// in order, with no buffering or reframing. If the upstream stream errors
/// mid-flight the body stream terminates with that error and the connection
/// ends abnormally; no second status can be sent (HTTP forbids changing
/// headers after the first bytes are flushed).
pub fn relay_streaming_response(upstream_response: reqwest::Response) -> Response {
    let stream = upstream_response.bytes_stream().map(|chunk_result| {
        match chunk_result {
            Ok(chunk) => {
                tracing::trace!(bytes = chunk.len(), "Relaying stream chunk");
                Ok(chunk)
            }
            Err(e) => {
                tracing::error!(error = %e, "Error reading upstream stream chunk");
                Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
            }
        }
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(stream))
        .unwrap()
        .into_response()
}
