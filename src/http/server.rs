//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a single catch-all handler
//! - Wire up middleware (request ID, tracing, CORS, timeout, body limit, panic catch)
//! - Dispatch requests through the route table
//! - Bind server to listener and stop on shutdown
//! - Observability (metrics, correlation IDs)

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::cache::ResponseCache;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};
use crate::http::middleware::cors_middleware;
use crate::http::proxy::{self, ProxyTarget};
use crate::http::request::{propagate_request_id_layer, set_request_id_layer, RequestIdExt};
use crate::http::{health, kv};
use crate::observability::metrics;
use crate::records::RecordStore;
use crate::routing::{RouteKind, RouteTable, KNOWN_ROUTES};
use crate::security::{CorsPolicy, HostAllowlist};
use crate::store::KvStore;
use crate::upstream::Upstream;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub records: RecordStore,
    pub cache: ResponseCache,
    pub cache_enabled: bool,
    pub allowlist: Arc<HostAllowlist>,
    pub upstream: Arc<dyn Upstream>,
    pub upstream_scheme: Arc<str>,
    pub upstream_timeout: Duration,
    pub user_agent: Arc<str>,
    pub status_sample: Arc<[i64]>,
    pub max_body_size: usize,
}

impl AppState {
    /// Assemble handler state over the two store namespaces and an upstream.
    pub fn new(
        config: &GatewayConfig,
        records_kv: Arc<dyn KvStore>,
        responses_kv: Arc<dyn KvStore>,
        upstream: Arc<dyn Upstream>,
    ) -> Self {
        Self {
            routes: Arc::new(RouteTable::standard()),
            records: RecordStore::new(records_kv, config.records.namespace.clone()),
            cache: ResponseCache::new(responses_kv, Duration::from_secs(config.cache.ttl_secs)),
            cache_enabled: config.cache.enabled,
            allowlist: Arc::new(HostAllowlist::new(&config.proxy.allowed_hosts)),
            upstream,
            upstream_scheme: Arc::from(config.proxy.upstream_scheme.as_str()),
            upstream_timeout: Duration::from_secs(config.timeouts.upstream_secs),
            user_agent: Arc::from(config.proxy.user_agent.as_str()),
            status_sample: Arc::from(config.records.status_sample.as_slice()),
            max_body_size: config.security.max_body_size,
        }
    }
}

/// Marks responses produced by the dispatcher, as opposed to a layer rejection.
#[derive(Debug, Clone, Copy)]
struct Dispatched;

/// Limits enforced by the tower-http layers, for rendering their rejections.
#[derive(Debug, Clone, Copy)]
struct LayerLimits {
    max_body_size: usize,
    request_timeout: Duration,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    pub fn new(config: GatewayConfig, state: AppState) -> Self {
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers listed last run first: request ID, trace, CORS, then limits.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let cors = Arc::new(CorsPolicy::new(
            &config.cors.allowed_origins,
            config.cors.max_age_secs,
        ));
        let limits = LayerLimits {
            max_body_size: config.security.max_body_size,
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        };

        Router::new()
            .route("/{*path}", any(gateway_handler))
            .route("/", any(gateway_handler))
            .with_state(state)
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(RequestBodyLimitLayer::new(limits.max_body_size))
            .layer(TimeoutLayer::new(limits.request_timeout))
            .layer(middleware::map_response_with_state(limits, render_layer_rejection))
            .layer(middleware::from_fn_with_state(cors, cors_middleware))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// A handle to the fully layered router, for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            allowed_hosts = ?self.config.proxy.allowed_hosts,
            cache_enabled = self.config.cache.enabled,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Single entry point: match the route table, dispatch, record metrics.
async fn gateway_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::debug!(
        request_id = %request.request_id(),
        method = %method,
        path = %path,
        "Dispatching request"
    );

    let (route, result) = match state.routes.match_path(&path) {
        Some(matched) => (
            matched.kind.name(),
            dispatch(&state, matched.kind, matched.param, request).await,
        ),
        None => (
            "none",
            Err(GatewayError::RouteNotFound {
                path: path.clone(),
                available: KNOWN_ROUTES,
            }),
        ),
    };

    let mut response = result.unwrap_or_else(IntoResponse::into_response);
    metrics::record_request(method.as_str(), route, response.status().as_u16(), start);
    response.extensions_mut().insert(Dispatched);
    response
}

/// Replace the plain-text 413 and empty 408 of the limit layers with JSON errors.
///
/// Upstream 408/413 answers pass through untouched.
async fn render_layer_rejection(State(limits): State<LayerLimits>, response: Response) -> Response {
    if response.extensions().get::<Dispatched>().is_some() {
        return response;
    }
    let error = match response.status() {
        StatusCode::PAYLOAD_TOO_LARGE => GatewayError::PayloadTooLarge {
            limit: limits.max_body_size,
        },
        StatusCode::REQUEST_TIMEOUT => GatewayError::RequestTimeout {
            after: limits.request_timeout,
        },
        _ => return response,
    };
    error.into_response()
}

async fn dispatch(
    state: &AppState,
    kind: RouteKind,
    param: &str,
    request: Request<Body>,
) -> GatewayResult<Response> {
    match kind {
        RouteKind::Info => health::info(state, &request),
        RouteKind::Health => health::health(&request),
        RouteKind::Chapter => kv::chapter(state, param, request).await,
        RouteKind::Populate => kv::populate(state, request).await,
        RouteKind::KvStatus => kv::status(state, request).await,
        RouteKind::KvRaw => kv::raw(state, param, request).await,
        RouteKind::Proxy => {
            let target = ProxyTarget::from_encoded(param, request.uri().query())?;
            proxy::forward(state, target, request).await
        }
        RouteKind::HostProxy => {
            let target =
                ProxyTarget::from_host_path(param, request.uri().query(), &state.upstream_scheme);
            proxy::forward(state, target, request).await
        }
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("non-string panic payload");
    tracing::error!(panic = %detail, "Request handler panicked");
    GatewayError::Internal("An unexpected error occurred".to_string()).into_response()
}
