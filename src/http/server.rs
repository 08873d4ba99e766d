//! HTTP server setup and the proxy handler.
//!
//! # Responsibilities
//! - Create the Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing span, CORS)
//! - Run the request pipeline: rewrite → forward → rewrite
//! - Hand upgrade requests to the WebSocket tunnel
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, Response, Version},
    middleware,
    response::IntoResponse,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::error::{ProxyError, StartupError};
use crate::http::request::make_request_span;
use crate::http::response::stream_body;
use crate::http::websocket;
use crate::lifecycle::shutdown;
use crate::observability::metrics;
use crate::rewrite::{cors_middleware, RequestRewriter, ResponseRewriter};
use crate::upstream::{UpstreamClient, UpstreamTarget};

/// Application state injected into handlers. Read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub target: Arc<UpstreamTarget>,
    pub upstream: UpstreamClient,
    pub request_rewriter: Arc<RequestRewriter>,
    pub response_rewriter: Arc<ResponseRewriter>,
}

impl AppState {
    /// Build every pipeline stage from a validated configuration.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, StartupError> {
        let target = UpstreamTarget::parse(&config.upstream.target).map_err(|e| {
            StartupError::Config(crate::config::ConfigError::Validation(vec![e.into()]))
        })?;
        let upstream = UpstreamClient::new(&config.timeouts)?;
        let request_rewriter = RequestRewriter::new(&config.upstream, &target)?;
        let response_rewriter =
            ResponseRewriter::new(&target, config.upstream.redirect_scheme.as_deref());

        Ok(Self {
            target: Arc::new(target),
            upstream,
            request_rewriter: Arc::new(request_rewriter),
            response_rewriter: Arc::new(response_rewriter),
        })
    }
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server with the given (validated) configuration.
    pub fn new(config: &ProxyConfig) -> Result<Self, StartupError> {
        let state = AppState::from_config(config)?;
        let router = Self::build_router(state);
        Ok(Self { router })
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
                    .layer(middleware::from_fn(cors_middleware)),
            )
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Rewrites the request, forwards it and rewrites the response.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response<Body> {
    if websocket::is_upgrade_request(&request) {
        return websocket::tunnel(state, request).await;
    }

    let start = Instant::now();
    let (mut parts, body) = request.into_parts();
    let method = parts.method.clone();
    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    let client_host = parts.headers.get(header::HOST).cloned();

    let uri = match state.target.uri_for(parts.uri.path_and_query()) {
        Ok(uri) => uri,
        Err(e) => return ProxyError::from(e).into_response(),
    };

    state.request_rewriter.rewrite(&mut parts.headers);
    tracing::info!(method = %method, path = %path, "Forwarding request");

    let mut outbound = Request::new(body);
    *outbound.method_mut() = method.clone();
    *outbound.uri_mut() = uri;
    *outbound.version_mut() = Version::HTTP_11;
    *outbound.headers_mut() = parts.headers;

    match state.upstream.forward(outbound).await {
        Ok(response) => {
            let (mut parts, body) = response.into_parts();
            state
                .response_rewriter
                .rewrite(parts.status, &mut parts.headers, client_host.as_ref());

            tracing::info!(method = %method, path = %path, status = parts.status.as_u16(), "Upstream responded");
            metrics::record_request(method.as_str(), parts.status.as_u16(), start);

            Response::from_parts(parts, stream_body(body, method.to_string(), path))
        }
        Err(e) => {
            metrics::record_upstream_error(e.kind());
            metrics::record_request(method.as_str(), 502, start);
            e.into_response()
        }
    }
}
