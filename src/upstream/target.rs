//! The fixed upstream the relay forwards to.

use std::str::FromStr;

use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{HeaderValue, Uri};
use thiserror::Error;
use url::Url;

/// Why a target URL was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TargetError {
    #[error("{0:?} is not an absolute URL")]
    Invalid(String),

    #[error("unsupported scheme {0:?}, expected http or https")]
    UnsupportedScheme(String),

    #[error("{0:?} has no host")]
    MissingHost(String),

    #[error("{0:?} must not carry a query or fragment")]
    QueryOrFragment(String),
}

/// Parsed upstream base URL.
///
/// Holds the pieces needed to turn an inbound path into an absolute upstream
/// URI and to present the right `Host`.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    scheme: Scheme,
    authority: Authority,
    host: HeaderValue,
    base_path: String,
}

impl UpstreamTarget {
    /// Parse a base URL such as `https://api.example.com` or
    /// `http://127.0.0.1:9000/prefix`.
    pub fn parse(target: &str) -> Result<Self, TargetError> {
        let url = Url::parse(target).map_err(|_| TargetError::Invalid(target.to_string()))?;

        let scheme = match url.scheme() {
            "http" => Scheme::HTTP,
            "https" => Scheme::HTTPS,
            other => return Err(TargetError::UnsupportedScheme(other.to_string())),
        };

        if url.query().is_some() || url.fragment().is_some() {
            return Err(TargetError::QueryOrFragment(target.to_string()));
        }

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| TargetError::MissingHost(target.to_string()))?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let authority =
            Authority::from_str(&authority).map_err(|_| TargetError::Invalid(target.to_string()))?;
        let host = HeaderValue::from_str(authority.as_str())
            .map_err(|_| TargetError::Invalid(target.to_string()))?;

        Ok(Self {
            scheme,
            authority,
            host,
            base_path: url.path().trim_end_matches('/').to_string(),
        })
    }

    /// Absolute upstream URI for an inbound path and query.
    ///
    /// A path on the target URL is kept as a prefix.
    pub fn uri_for(&self, path_and_query: Option<&PathAndQuery>) -> Result<Uri, axum::http::Error> {
        let inbound = path_and_query.map(PathAndQuery::as_str).unwrap_or("/");
        let joined = if self.base_path.is_empty() {
            inbound.to_string()
        } else {
            format!("{}{}", self.base_path, inbound)
        };

        Uri::builder()
            .scheme(self.scheme.clone())
            .authority(self.authority.clone())
            .path_and_query(joined)
            .build()
    }

    /// `Host` header value for the upstream.
    pub fn host_header(&self) -> &HeaderValue {
        &self.host
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }
}
