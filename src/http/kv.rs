//! Record store routes: `/kv/chapter/{id}`, `/kv/populate`, `/kv/status`, `/kv/raw/{key}`.

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::{GatewayError, GatewayResult};
use crate::http::request::read_body;
use crate::http::server::AppState;
use crate::now_rfc3339;
use crate::records::{ChapterId, Record};

const CHAPTER_METHODS: &[&str] = &["GET", "PUT"];
const POST_ONLY: &[&str] = &["POST"];
const GET_ONLY: &[&str] = &["GET"];

/// Reject methods outside `allowed` with 405.
pub(crate) fn ensure_method(method: &Method, allowed: &'static [&'static str]) -> GatewayResult<()> {
    if allowed.contains(&method.as_str()) || (method == Method::HEAD && allowed.contains(&"GET")) {
        return Ok(());
    }
    Err(GatewayError::MethodNotAllowed {
        method: method.to_string(),
        allowed,
    })
}

/// `GET|PUT /kv/chapter/{id}`
pub async fn chapter(state: &AppState, raw_id: &str, request: Request<Body>) -> GatewayResult<Response> {
    ensure_method(request.method(), CHAPTER_METHODS)?;
    let id = ChapterId::parse(raw_id)?;

    if request.method() == Method::PUT {
        let body = read_body(request.into_body(), state.max_body_size).await?;
        let record = Record::from_json(&body)?;
        let ack = state.records.put_record(id.into(), record).await?;
        tracing::info!(chapter = ack.chapter, verses = ack.verse_count, "Stored chapter");
        return Ok(Json(ack).into_response());
    }

    let record = state.records.get_record(id.into()).await?;
    let mut body = match serde_json::to_value(&record) {
        Ok(Value::Object(map)) => map,
        Ok(_) => Map::new(),
        Err(e) => return Err(GatewayError::Internal(format!("record encoding failed: {}", e))),
    };
    body.insert("source".into(), json!("kv"));
    body.insert("retrievedAt".into(), json!(now_rfc3339()));
    Ok(Json(Value::Object(body)).into_response())
}

#[derive(Debug, Deserialize)]
struct PopulateRequest {
    chapters: Option<Map<String, Value>>,
}

/// `POST /kv/populate`
pub async fn populate(state: &AppState, request: Request<Body>) -> GatewayResult<Response> {
    ensure_method(request.method(), POST_ONLY)?;
    let body = read_body(request.into_body(), state.max_body_size).await?;

    let chapters = serde_json::from_slice::<PopulateRequest>(&body)
        .ok()
        .and_then(|r| r.chapters)
        .ok_or_else(|| {
            GatewayError::validation("Invalid request", "Request must include chapters object")
        })?;

    let results = state.records.bulk_put(chapters).await;

    Ok(Json(json!({
        "message": "Bulk population completed",
        "results": results,
        "timestamp": now_rfc3339(),
    }))
    .into_response())
}

/// `GET /kv/status`
pub async fn status(state: &AppState, request: Request<Body>) -> GatewayResult<Response> {
    ensure_method(request.method(), GET_ONLY)?;

    match state.records.status(&state.status_sample).await {
        Ok(report) => Ok(Json(json!({
            "kvStatus": "healthy",
            "namespace": state.records.namespace(),
            "sampleStatus": report,
            "timestamp": now_rfc3339(),
        }))
        .into_response()),
        Err(e) => {
            tracing::error!(error = %e, "Record store status probe failed");
            Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "kvStatus": "error",
                    "error": e.label(),
                    "message": e.to_string(),
                    "timestamp": now_rfc3339(),
                })),
            )
                .into_response())
        }
    }
}

/// `GET /kv/raw/{key}`
pub async fn raw(state: &AppState, raw_key: &str, request: Request<Body>) -> GatewayResult<Response> {
    ensure_method(request.method(), GET_ONLY)?;

    let key = urlencoding::decode(raw_key)
        .map_err(|_| GatewayError::validation("Key required", "Key is not valid UTF-8"))?;
    if key.is_empty() {
        return Err(GatewayError::validation(
            "Key required",
            "Please provide a key to retrieve",
        ));
    }

    let response = match state.records.raw(&key).await? {
        Some(value) => (
            [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
            value,
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))],
            "null",
        )
            .into_response(),
    };
    Ok(response)
}
