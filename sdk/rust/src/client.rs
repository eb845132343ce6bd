use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Acknowledgment of a stored chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PutAck {
    pub success: bool,
    pub chapter: u16,
    pub verse_count: usize,
    pub message: String,
    pub stored_at: String,
}

/// Per-chapter outcome of a populate call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulateResults {
    pub success: usize,
    pub failed: usize,
    pub chapters: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct PopulateResponse {
    results: PopulateResults,
}

/// A proxied upstream answer.
#[derive(Debug, Clone)]
pub struct ProxiedResponse {
    pub status: StatusCode,
    /// `HIT` or `MISS`.
    pub cache: Option<String>,
    pub body: String,
}

pub struct GatewayClient {
    client: Client,
    gateway_url: String,
}

impl GatewayClient {
    pub fn new(gateway_url: &str) -> Self {
        Self {
            client: Client::new(),
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.gateway_url, path)
    }

    async fn json(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, SdkError> {
        let mut request = self.client.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        let resp = request.send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(SdkError::Status { status, body: text });
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// `GET /health`
    pub async fn health(&self) -> Result<Value, SdkError> {
        self.json(Method::GET, "/health", None).await
    }

    /// `GET /kv/status`
    pub async fn status(&self) -> Result<Value, SdkError> {
        self.json(Method::GET, "/kv/status", None).await
    }

    /// Fetch a stored chapter. `Ok(None)` when it has not been written yet.
    pub async fn get_chapter(&self, chapter: u16) -> Result<Option<Value>, SdkError> {
        match self
            .json(Method::GET, &format!("/kv/chapter/{}", chapter), None)
            .await
        {
            Ok(record) => Ok(Some(record)),
            Err(SdkError::Status { status, .. }) if status == StatusCode::NOT_FOUND => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Store one chapter. `record` must carry a non-empty `verses` object.
    pub async fn put_chapter(&self, chapter: u16, record: &Value) -> Result<PutAck, SdkError> {
        let value = self
            .json(Method::PUT, &format!("/kv/chapter/{}", chapter), Some(record))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Store many chapters at once, keyed by chapter number.
    pub async fn populate(&self, chapters: Map<String, Value>) -> Result<PopulateResults, SdkError> {
        let body = json!({ "chapters": chapters });
        let value = self.json(Method::POST, "/kv/populate", Some(&body)).await?;
        let response: PopulateResponse = serde_json::from_value(value)?;
        Ok(response.results)
    }

    /// Read any key in the record namespace verbatim.
    pub async fn raw(&self, key: &str) -> Result<Option<String>, SdkError> {
        let resp = self
            .client
            .get(self.url(&format!("/kv/raw/{}", urlencoding::encode(key))))
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        match status {
            StatusCode::NOT_FOUND => Ok(None),
            s if s.is_success() => Ok(Some(text)),
            status => Err(SdkError::Status { status, body: text }),
        }
    }

    /// Fetch an absolute upstream URL through `/proxy/`.
    pub async fn proxy_get(&self, target_url: &str) -> Result<ProxiedResponse, SdkError> {
        let resp = self
            .client
            .get(self.url(&format!("/proxy/{}", urlencoding::encode(target_url))))
            .send()
            .await?;

        let status = resp.status();
        let cache = resp
            .headers()
            .get("x-cache")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.text().await?;
        Ok(ProxiedResponse {
            status,
            cache,
            body,
        })
    }
}
