//! WebSocket tunnel.
//!
//! # Responsibilities
//! - Detect upgrade requests
//! - Forward the handshake upstream with only `Host` changed
//! - Relay raw bytes between the two upgraded connections
//!
//! # Data Flow
//! ```text
//! Client ←──── raw bytes ────→ Proxy ←──── raw bytes ────→ Backend
//! ```
//!
//! # Design Decisions
//! - No CORS, no header rewriting, no frame parsing
//! - A non-101 upstream answer is returned to the client as-is
//! - The relay task ends when either side closes

use axum::{
    body::Body,
    http::{header, HeaderValue, Method, Request, Response, StatusCode, Version},
    response::IntoResponse,
};
use hyper::upgrade::OnUpgrade;
use hyper_util::rt::TokioIo;

use crate::error::ProxyError;
use crate::http::response::stream_body;
use crate::http::server::AppState;
use crate::observability::metrics;

/// `Connection: upgrade` together with an `Upgrade` header.
pub fn is_upgrade_request<B>(request: &Request<B>) -> bool {
    let connection_upgrade = request
        .headers()
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

    connection_upgrade && request.headers().contains_key(header::UPGRADE)
}

fn is_websocket_handshake<B>(request: &Request<B>) -> bool {
    request.method() == Method::GET
        && request
            .headers()
            .get(header::UPGRADE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("websocket"))
}

/// Tunnel an upgrade request to the upstream.
pub async fn tunnel(state: AppState, mut request: Request<Body>) -> Response<Body> {
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    if !is_websocket_handshake(&request) {
        tracing::warn!(method = %request.method(), path = %path, "Refusing non-WebSocket upgrade");
        return StatusCode::BAD_REQUEST.into_response();
    }

    tracing::info!(path = %path, "Upgrading connection");

    let uri = match state.target.uri_for(request.uri().path_and_query()) {
        Ok(uri) => uri,
        Err(e) => return ProxyError::from(e).into_response(),
    };

    let client_upgrade = hyper::upgrade::on(&mut request);

    let mut headers = request.headers().clone();
    headers.insert(header::HOST, state.target.host_header().clone());

    let mut handshake = Request::new(Body::empty());
    *handshake.method_mut() = Method::GET;
    *handshake.uri_mut() = uri;
    *handshake.version_mut() = Version::HTTP_11;
    *handshake.headers_mut() = headers;

    let mut upstream_response = match state.upstream.forward(handshake).await {
        Ok(response) => response,
        Err(e) => {
            metrics::record_upstream_error(e.kind());
            return e.into_response();
        }
    };

    if upstream_response.status() != StatusCode::SWITCHING_PROTOCOLS {
        tracing::info!(path = %path, status = %upstream_response.status(), "Upstream declined upgrade");
        let (parts, body) = upstream_response.into_parts();
        return Response::from_parts(parts, stream_body(body, Method::GET.to_string(), path));
    }

    let upstream_upgrade = hyper::upgrade::on(&mut upstream_response);
    let (parts, _) = upstream_response.into_parts();

    tokio::spawn(relay(client_upgrade, upstream_upgrade, path));

    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::SWITCHING_PROTOCOLS;
    *response.headers_mut() = parts.headers;
    response
        .headers_mut()
        .entry(header::CONNECTION)
        .or_insert(HeaderValue::from_static("upgrade"));
    response
}

async fn relay(client: OnUpgrade, upstream: OnUpgrade, path: String) {
    let (client, upstream) = match tokio::try_join!(client, upstream) {
        Ok(pair) => pair,
        Err(e) => {
            let e = ProxyError::from(e);
            metrics::record_upstream_error(e.kind());
            tracing::warn!(path = %path, error = %e, "Upgrade did not complete");
            return;
        }
    };

    let mut client = TokioIo::new(client);
    let mut upstream = TokioIo::new(upstream);

    metrics::tunnel_opened();
    match tokio::io::copy_bidirectional(&mut client, &mut upstream).await {
        Ok((sent, received)) => {
            tracing::info!(path = %path, bytes_sent = sent, bytes_received = received, "WebSocket closed");
        }
        Err(e) => {
            tracing::debug!(path = %path, error = %e, "WebSocket relay ended with error");
        }
    }
    metrics::tunnel_closed();
}
