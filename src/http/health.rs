//! Liveness and gateway info routes.

use axum::{
    body::Body,
    http::Request,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::GatewayResult;
use crate::http::kv::ensure_method;
use crate::http::server::AppState;
use crate::now_rfc3339;

pub const FEATURES: &[&str] = &["cors-proxy", "kv-storage", "response-cache"];

/// `GET /health`
pub fn health(request: &Request<Body>) -> GatewayResult<Response> {
    ensure_method(request.method(), &["GET"])?;
    Ok(Json(json!({
        "status": "healthy",
        "timestamp": now_rfc3339(),
        "features": FEATURES,
        "worker": env!("CARGO_PKG_NAME"),
    }))
    .into_response())
}

/// `GET /`
pub fn info(state: &AppState, request: &Request<Body>) -> GatewayResult<Response> {
    ensure_method(request.method(), &["GET"])?;
    Ok(Json(json!({
        "status": "OK",
        "message": "Edge gateway with KV caching is running",
        "timestamp": now_rfc3339(),
        "allowedHosts": state.allowlist.hosts(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
    .into_response())
}
