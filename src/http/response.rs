//! Response helpers.
//!
//! # Responsibilities
//! - Map forwarding failures to the 502 JSON error body
//! - Keep streaming upstream bodies observable after headers are sent
//!
//! # Design Decisions
//! - A failure before headers becomes 502; after headers it can only be
//!   logged, and hyper aborts the connection

use axum::{
    body::Body,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use serde::Serialize;

use crate::error::ProxyError;

/// JSON body of every 502 produced by the relay.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, kind = self.kind(), "Proxy error");
        let body = ErrorBody {
            error: "Proxy error",
            message: self.to_string(),
        };
        (StatusCode::BAD_GATEWAY, Json(body)).into_response()
    }
}

/// Wrap an upstream body so a mid-stream failure is logged before hyper
/// drops the client connection.
pub fn stream_body(body: Incoming, method: String, path: String) -> Body {
    Body::new(body.map_err(move |err| {
        tracing::warn!(
            method = %method,
            path = %path,
            error = %err,
            "Upstream body failed after response headers were sent"
        );
        err
    }))
}
