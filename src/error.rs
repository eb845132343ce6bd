//! Gateway error taxonomy and its HTTP rendering.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::records::{MAX_CHAPTER, MIN_CHAPTER};
use crate::store::KvError;

/// Every failure a request can end in.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("host '{host}' is not an allowed upstream")]
    InvalidHost {
        host: String,
        allowed: Vec<String>,
        path: String,
    },

    #[error("chapter '{raw}' is out of range")]
    OutOfRangeId { raw: String },

    #[error("{message}")]
    Validation {
        reason: &'static str,
        message: String,
    },

    #[error("chapter {chapter} not found")]
    RecordNotFound { chapter: u16 },

    #[error("no route for {path}")]
    RouteNotFound {
        path: String,
        available: &'static [&'static str],
    },

    #[error("method {method} not allowed")]
    MethodNotAllowed {
        method: String,
        allowed: &'static [&'static str],
    },

    #[error("request body exceeds the {limit} byte limit")]
    PayloadTooLarge { limit: usize },

    #[error("request did not complete within {after:?}")]
    RequestTimeout { after: Duration },

    #[error("upstream {url} did not answer within {after:?}")]
    UpstreamTimeout { url: String, after: Duration },

    #[error("upstream {url} failed: {message}")]
    UpstreamError { url: String, message: String },

    #[error("KV operation failed: {0}")]
    Store(#[from] KvError),

    #[error("{0}")]
    Internal(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

impl GatewayError {
    pub fn validation(reason: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            reason,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidHost { .. } => StatusCode::FORBIDDEN,
            Self::OutOfRangeId { .. } | Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::RecordNotFound { .. } | Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RequestTimeout { .. } => StatusCode::REQUEST_TIMEOUT,
            Self::UpstreamTimeout { .. } => StatusCode::BAD_GATEWAY,
            Self::UpstreamError { .. } | Self::Store(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The short `error` label of the JSON body.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InvalidHost { .. } => "Forbidden: Invalid target host",
            Self::OutOfRangeId { .. } => "Invalid chapter number",
            Self::Validation { reason, .. } => *reason,
            Self::RecordNotFound { .. } => "Chapter not found",
            Self::RouteNotFound { .. } => "Not Found",
            Self::MethodNotAllowed { .. } => "Method not allowed",
            Self::PayloadTooLarge { .. } => "Payload too large",
            Self::RequestTimeout { .. } => "Request timeout",
            Self::UpstreamTimeout { .. } => "Upstream timeout",
            Self::UpstreamError { .. } => "Proxy error",
            Self::Store(_) => "KV operation failed",
            Self::Internal(_) => "Internal Server Error",
        }
    }

    fn body(&self) -> Value {
        let mut body = Map::new();
        body.insert("error".into(), json!(self.label()));

        let message = match self {
            Self::OutOfRangeId { .. } => format!(
                "Chapter number must be between {} and {}",
                MIN_CHAPTER, MAX_CHAPTER
            ),
            Self::RecordNotFound { .. } => "Chapter data not available in KV storage".to_string(),
            Self::Store(e) => e.to_string(),
            other => other.to_string(),
        };
        body.insert("message".into(), json!(message));

        match self {
            Self::InvalidHost {
                host,
                allowed,
                path,
            } => {
                body.insert("requestedHost".into(), json!(host));
                body.insert("allowedHosts".into(), json!(allowed));
                body.insert("path".into(), json!(path));
            }
            Self::OutOfRangeId { raw } => {
                body.insert("chapter".into(), json!(raw));
            }
            Self::RecordNotFound { chapter } => {
                body.insert("chapter".into(), json!(chapter));
            }
            Self::RouteNotFound { available, .. } => {
                body.insert("availableRoutes".into(), json!(available));
            }
            Self::MethodNotAllowed { allowed, .. } => {
                body.insert("allowed".into(), json!(allowed));
            }
            Self::PayloadTooLarge { limit } => {
                body.insert("maxBodySize".into(), json!(limit));
            }
            _ => {}
        }

        if self.status().is_server_error() {
            body.insert("timestamp".into(), json!(crate::now_rfc3339()));
        }

        Value::Object(body)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = %status, "Request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }
        (status, Json(self.body())).into_response()
    }
}
