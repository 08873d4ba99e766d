//! Error types.

use std::time::Duration;

use thiserror::Error;

use crate::config::ConfigError;

/// A failure while forwarding one request upstream.
///
/// Every variant is answered with 502 when no response has been sent yet.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("failed to build upstream request: {0}")]
    Request(#[from] axum::http::Error),

    #[error("{}", describe(.0))]
    Forward(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("connection upgrade failed: {}", describe(.0))]
    Upgrade(#[from] hyper::Error),
}

impl ProxyError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Request(_) => "request",
            ProxyError::Forward(e) if e.is_connect() => "connect",
            ProxyError::Forward(_) => "forward",
            ProxyError::Timeout(_) => "timeout",
            ProxyError::Upgrade(_) => "upgrade",
        }
    }
}

/// Render an error and its whole source chain, e.g.
/// `client error (Connect): tcp connect error: Connection refused (os error 111)`.
fn describe(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.ends_with(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}

/// Fatal errors while bringing the relay up.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to set up upstream TLS: {0}")]
    Tls(#[from] rustls::Error),

    #[error("invalid header value for {0}")]
    Header(&'static str),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[derive(Debug, Error)]
    #[error("client error (Connect)")]
    struct Outer(#[source] Inner);

    #[derive(Debug, Error)]
    #[error("tcp connect error")]
    struct Inner(#[source] io::Error);

    #[test]
    fn describe_walks_the_source_chain() {
        let err = Outer(Inner(io::Error::new(io::ErrorKind::ConnectionRefused, "Connection refused")));
        assert_eq!(
            describe(&err),
            "client error (Connect): tcp connect error: Connection refused"
        );
    }

    #[test]
    fn timeout_message_names_the_limit() {
        let err = ProxyError::Timeout(Duration::from_secs(5));
        assert_eq!(err.to_string(), "upstream did not respond within 5s");
        assert_eq!(err.kind(), "timeout");
    }
}
