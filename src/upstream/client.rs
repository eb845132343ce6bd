//! HTTP(S) upstream client.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{GatewayError, GatewayResult};
use crate::observability::metrics;
use crate::upstream::{Upstream, UpstreamRequest, UpstreamResponse};

/// Forwards requests with a pooled `reqwest` client.
#[derive(Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    connect_timeout: Duration,
}

impl HttpUpstream {
    /// Build a client whose connect phase is bounded by `connect_timeout`.
    pub fn new(connect_timeout: Duration) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| GatewayError::Internal(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            connect_timeout,
        })
    }

    fn map_error(&self, url: &str, error: reqwest::Error) -> GatewayError {
        metrics::record_upstream("error");
        if error.is_timeout() {
            GatewayError::UpstreamTimeout {
                url: url.to_string(),
                after: self.connect_timeout,
            }
        } else {
            GatewayError::UpstreamError {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, request: UpstreamRequest) -> GatewayResult<UpstreamResponse> {
        let UpstreamRequest {
            method,
            url,
            headers,
            body,
        } = request;

        tracing::debug!(method = %method, url = %url, "Forwarding to upstream");

        let mut builder = self.client.request(method.clone(), &url).headers(headers);
        if method != reqwest::Method::GET && method != reqwest::Method::HEAD {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| self.map_error(&url, e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| self.map_error(&url, e))?;

        metrics::record_upstream(if status.is_success() { "success" } else { "non_success" });
        tracing::debug!(url = %url, status = %status, bytes = body.len(), "Upstream responded");

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}
