//! Pooled HTTP/1.1 client used to reach the upstream.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;

use crate::config::TimeoutConfig;
use crate::error::ProxyError;

/// Forwarding collaborator: sends a prepared request and returns the
/// upstream response head with a streaming body.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    request_timeout: Option<Duration>,
}

impl UpstreamClient {
    /// Build a client that speaks plain HTTP or HTTPS (webpki roots, ring provider).
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, rustls::Error> {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_nodelay(true);
        http.set_connect_timeout(timeouts.connect_secs.map(Duration::from_secs));

        let https = HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())?
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let client = Client::builder(TokioExecutor::new()).build(https);

        Ok(Self {
            client,
            request_timeout: timeouts.request_secs.map(Duration::from_secs),
        })
    }

    /// Send a request and wait for the response head.
    ///
    /// No retries. The request timeout, when configured, covers everything up
    /// to the response headers; the body is streamed afterwards without limit.
    pub async fn forward(&self, request: Request<Body>) -> Result<Response<Incoming>, ProxyError> {
        let pending = self.client.request(request);
        match self.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, pending).await {
                Ok(result) => Ok(result?),
                Err(_) => Err(ProxyError::Timeout(limit)),
            },
            None => Ok(pending.await?),
        }
    }
}
