//! Request handler for the relay endpoint

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    response::{IntoResponse, Response},
};

use super::server::RelayState;
use super::streaming::relay_streaming_response;
use crate::config::API_KEY_ENV;

/// Maximum inbound body size (bytes)
const MAX_BODY_BYTES: usize = 1024 * 1024 * 10;

/// Returns true for payloads that count as a missing body: `null`, `false`,
/// `0`, and `""`. Anything else is forwarded upstream.
fn is_missing_payload(payload: &serde_json::Value) -> bool {
    match payload {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(b) => !b,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Build the outbound payload from the caller's payload.
///
/// The inbound value is treated as immutable; a new value is constructed with
/// `stream` forced to `true` and every other field preserved, whatever the
/// caller supplied for `stream`. Non-object payloads are forwarded unchanged,
/// since there is no field to force on them.
fn build_upstream_payload(inbound: &serde_json::Value) -> serde_json::Value {
    match inbound {
        serde_json::Value::Object(map) => {
            let mut outbound = map.clone();
            outbound.insert("stream".to_string(), serde_json::Value::Bool(true));
            serde_json::Value::Object(outbound)
        }
        other => other.clone(),
    }
}

/// Relay request handler
pub struct RelayHandler {
    state: RelayState,
}

impl RelayHandler {
    pub fn new(state: RelayState) -> Self {
        Self { state }
    }

    /// Handle an incoming request.
    ///
    /// Preconditions are checked in order, each a terminal short-circuit:
    /// method, credential, body. Only then is the upstream contacted.
    pub async fn handle(&self, req: Request<Body>) -> Response {
        if req.method() != Method::POST {
            return (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed").into_response();
        }

        let Some(api_key) = self.state.api_key.as_deref() else {
            tracing::error!("{} not configured, refusing request", API_KEY_ENV);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{} not configured", API_KEY_ENV),
            )
                .into_response();
        };

        let body_bytes = match to_bytes(req.into_body(), MAX_BODY_BYTES).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read request body");
                return (
                    StatusCode::BAD_REQUEST,
                    format!("Failed to read request body: {}", e),
                )
                    .into_response();
            }
        };

        if body_bytes.is_empty() {
            return (StatusCode::BAD_REQUEST, "Missing JSON body").into_response();
        }

        let inbound: serde_json::Value = match serde_json::from_slice(&body_bytes) {
            Ok(json) => json,
            Err(e) => {
                tracing::debug!(error = %e, "Rejecting unparseable request body");
                return (StatusCode::BAD_REQUEST, "Invalid JSON body").into_response();
            }
        };
        if is_missing_payload(&inbound) {
            return (StatusCode::BAD_REQUEST, "Missing JSON body").into_response();
        }

        let outbound = build_upstream_payload(&inbound);
        let endpoint = self.state.config.upstream.endpoint();

        tracing::debug!(upstream = %endpoint, "Forwarding chat completion request");

        let upstream_response = match self
            .state
            .http_client
            .post(endpoint)
            .header(header::AUTHORIZATION, format!("Bearer {}", api_key))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&outbound)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                tracing::error!(error = %e, "Failed to reach upstream");
                // Headers have not been sent yet, so a real error status is
                // still possible on this path.
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Relay error: {}", e),
                )
                    .into_response();
            }
        };

        let status = upstream_response.status();
        tracing::debug!(status = %status, "Received upstream response");

        if !status.is_success() {
            // Relay the upstream rejection verbatim with its own status
            let error_body = match upstream_response.text().await {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read upstream error body");
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        format!("Relay error: {}", e),
                    )
                        .into_response();
                }
            };
            tracing::warn!(status = %status, body = %error_body, "Upstream rejected request");
            return Response::builder()
                .status(status)
                .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(Body::from(error_body))
                .unwrap()
                .into_response();
        }

        relay_streaming_response(upstream_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_forces_stream_true() {
        let inbound = json!({"model": "x", "messages": [{"role": "user", "content": "hi"}]});
        let outbound = build_upstream_payload(&inbound);
        assert_eq!(outbound["stream"], json!(true));
    }

    #[test]
    fn test_payload_overrides_stream_false() {
        let inbound = json!({"model": "x", "stream": false});
        let outbound = build_upstream_payload(&inbound);
        assert_eq!(outbound["stream"], json!(true));
    }

    #[test]
    fn test_payload_preserves_unknown_fields() {
        let inbound = json!({
            "model": "x",
            "messages": [{"role": "user", "content": "hi"}],
            "temperature": 0.7,
            "some_vendor_extension": {"nested": [1, 2, 3]}
        });
        let outbound = build_upstream_payload(&inbound);
        assert_eq!(outbound["model"], inbound["model"]);
        assert_eq!(outbound["messages"], inbound["messages"]);
        assert_eq!(outbound["temperature"], inbound["temperature"]);
        assert_eq!(
            outbound["some_vendor_extension"],
            inbound["some_vendor_extension"]
        );
    }

    #[test]
    fn test_payload_does_not_mutate_inbound() {
        let inbound = json!({"model": "x", "stream": false});
        let _ = build_upstream_payload(&inbound);
        assert_eq!(inbound["stream"], json!(false));
    }

    #[test]
    fn test_missing_payload_values() {
        assert!(is_missing_payload(&json!(null)));
        assert!(is_missing_payload(&json!(false)));
        assert!(is_missing_payload(&json!(0)));
        assert!(is_missing_payload(&json!(0.0)));
        assert!(is_missing_payload(&json!("")));

        assert!(!is_missing_payload(&json!(true)));
        assert!(!is_missing_payload(&json!(1)));
        assert!(!is_missing_payload(&json!("x")));
        assert!(!is_missing_payload(&json!({})));
        assert!(!is_missing_payload(&json!([])));
    }

    #[test]
    fn test_payload_non_object_unchanged() {
        let inbound = json!([1, 2, 3]);
        assert_eq!(build_upstream_payload(&inbound), inbound);
    }
}
