//! Request handling helpers.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) unless the client sent one
//! - Echo the request ID on every response
//! - Buffer request bodies for forwarding and record writes
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Body size is bounded by the limit layer before it is buffered here

use axum::body::{Body, Bytes};
use axum::http::{HeaderName, HeaderValue, Request};
use http_body_util::LengthLimitError;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use uuid::Uuid;

use crate::error::{GatewayError, GatewayResult};

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Assigns `x-request-id` to requests that arrive without one.
pub fn set_request_id_layer() -> SetRequestIdLayer<UuidRequestId> {
    SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId)
}

/// Copies the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Read access to the assigned request ID.
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        self.headers()
            .get(&X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }
}

/// Buffer a request body of at most `limit` bytes.
///
/// Bodies without a `Content-Length` pass the limit layer unchecked and are
/// cut off here instead.
pub async fn read_body(body: Body, limit: usize) -> GatewayResult<Bytes> {
    axum::body::to_bytes(body, limit).await.map_err(|e| {
        if exceeds_limit(&e) {
            GatewayError::PayloadTooLarge { limit }
        } else {
            GatewayError::validation("Invalid request", format!("Unreadable request body: {}", e))
        }
    })
}

fn exceeds_limit(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if e.is::<LengthLimitError>() {
            return true;
        }
        current = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_fallback() {
        let request = Request::builder().uri("/").body(()).unwrap();
        assert_eq!(request.request_id(), "unknown");

        let request = Request::builder()
            .uri("/")
            .header("x-request-id", "abc-123")
            .body(())
            .unwrap();
        assert_eq!(request.request_id(), "abc-123");
    }

    #[tokio::test]
    async fn test_read_body_enforces_limit() {
        let body = read_body(Body::from("0123456789"), 10).await.unwrap();
        assert_eq!(body.len(), 10);

        let err = read_body(Body::from("0123456789abcdef"), 10).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::PAYLOAD_TOO_LARGE);
        assert!(matches!(err, GatewayError::PayloadTooLarge { limit: 10 }));
    }

    #[test]
    fn test_generated_ids_are_uuids() {
        let request = Request::builder().uri("/").body(()).unwrap();
        let id = UuidRequestId.make_request_id(&request).unwrap();
        let text = id.header_value().to_str().unwrap();
        assert!(Uuid::parse_str(text).is_ok());
    }
}
