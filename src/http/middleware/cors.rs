//! CORS middleware.
//!
//! Answers preflight requests for every path and stamps the resolved CORS
//! headers on every other response, error and panic responses included.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::security::CorsPolicy;

pub async fn cors_middleware(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    if request.method() == Method::OPTIONS {
        tracing::debug!(origin = ?origin, path = %request.uri().path(), "Answering preflight");
        let mut response = StatusCode::OK.into_response();
        apply(response.headers_mut(), policy.resolve(origin.as_deref(), true));
        return response;
    }

    let mut response = next.run(request).await;
    apply(response.headers_mut(), policy.resolve(origin.as_deref(), false));
    response
}

fn apply(target: &mut HeaderMap, cors: HeaderMap) {
    for (name, value) in cors.iter() {
        if *name == header::VARY {
            target.append(name.clone(), value.clone());
        } else {
            target.insert(name.clone(), value.clone());
        }
    }
}
