//! Permissive CORS responder.
//!
//! Answers preflights locally and decorates every other response so a page
//! served from any host can call the upstream with credentials.

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderValue, Method, Response, StatusCode},
    middleware::Next,
};

use crate::http::websocket::is_upgrade_request;
use crate::observability::metrics;

pub const ALLOW_METHODS: &str = "GET, POST, PUT, PATCH, DELETE, OPTIONS, HEAD";
pub const DEFAULT_ALLOW_HEADERS: &str = "Content-Type, Authorization";
pub const EXPOSE_HEADERS: &str = "Set-Cookie, Authorization, Content-Length";
pub const MAX_AGE: &str = "86400";

/// CORS headers derived from one inbound request.
#[derive(Debug, Clone)]
pub struct CorsHeaders {
    allow_origin: HeaderValue,
    allow_headers: HeaderValue,
}

impl CorsHeaders {
    /// Echo the caller's `Origin` and requested headers, falling back to
    /// `*` and the default header list.
    ///
    /// Origin-less requests get `*` even though credentials are allowed.
    pub fn from_request(headers: &HeaderMap) -> Self {
        Self {
            allow_origin: non_empty(headers, header::ORIGIN)
                .unwrap_or_else(|| HeaderValue::from_static("*")),
            allow_headers: joined(headers, header::ACCESS_CONTROL_REQUEST_HEADERS)
                .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_ALLOW_HEADERS)),
        }
    }

    /// Set all six CORS headers, replacing whatever was there.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin.clone());
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, self.allow_headers.clone());
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(
            header::ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static(EXPOSE_HEADERS),
        );
        headers.insert(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE));
    }

    /// 204 with an empty body and the CORS headers.
    pub fn preflight_response(&self) -> Response<Body> {
        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::NO_CONTENT;
        self.apply(response.headers_mut());
        response
    }
}

fn non_empty(headers: &HeaderMap, name: header::HeaderName) -> Option<HeaderValue> {
    headers.get(name).filter(|v| !v.is_empty()).cloned()
}

/// All non-empty fields of a list-valued header, joined with `, `.
fn joined(headers: &HeaderMap, name: header::HeaderName) -> Option<HeaderValue> {
    let fields: Vec<&[u8]> = headers
        .get_all(name)
        .iter()
        .filter(|v| !v.is_empty())
        .map(HeaderValue::as_bytes)
        .collect();
    match fields.as_slice() {
        [] => None,
        [single] => HeaderValue::from_bytes(single).ok(),
        _ => HeaderValue::from_bytes(&fields.join(&b", "[..])).ok(),
    }
}

/// Middleware: short-circuit `OPTIONS`, decorate everything else.
///
/// Upgrade requests pass through untouched.
pub async fn cors_middleware(request: Request, next: Next) -> Response<Body> {
    if is_upgrade_request(&request) {
        return next.run(request).await;
    }

    let cors = CorsHeaders::from_request(request.headers());

    if request.method() == Method::OPTIONS {
        tracing::debug!(path = %request.uri().path(), "Answering preflight");
        metrics::record_preflight();
        return cors.preflight_response();
    }

    let mut response = next.run(request).await;
    cors.apply(response.headers_mut());
    response
}
