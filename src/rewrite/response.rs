//! Inbound header rewriting.

use std::str::FromStr;

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};
use axum::http::uri::{Authority, Scheme};
use axum::http::{StatusCode, Uri};

use crate::rewrite::cookie::rewrite_set_cookies;
use crate::rewrite::hop_by_hop::strip_hop_by_hop;
use crate::upstream::UpstreamTarget;

/// Headers that would stop the relay's origin from framing, sniffing or
/// talking plain HTTP to the upstream's content.
pub const BLOCKED_HEADERS: [HeaderName; 4] = [
    header::X_FRAME_OPTIONS,
    header::CONTENT_SECURITY_POLICY,
    header::X_CONTENT_TYPE_OPTIONS,
    header::STRICT_TRANSPORT_SECURITY,
];

/// Loosens upstream responses so a browser on another host accepts them.
#[derive(Debug, Clone)]
pub struct ResponseRewriter {
    target_authority: Authority,
    redirect_scheme: Option<Scheme>,
}

impl ResponseRewriter {
    pub fn new(target: &UpstreamTarget, redirect_scheme: Option<&str>) -> Self {
        Self {
            target_authority: target.authority().clone(),
            redirect_scheme: redirect_scheme.and_then(|s| Scheme::from_str(s).ok()),
        }
    }

    /// Rewrite the upstream response headers. Status and body are not touched.
    ///
    /// `client_host` is the `Host` the client used to reach the relay; it
    /// replaces the upstream authority in redirect locations.
    pub fn rewrite(
        &self,
        status: StatusCode,
        headers: &mut HeaderMap,
        client_host: Option<&HeaderValue>,
    ) {
        strip_hop_by_hop(headers);
        rewrite_set_cookies(headers);
        for name in &BLOCKED_HEADERS {
            headers.remove(name);
        }

        if is_redirect(status) {
            if let Some(host) = client_host {
                self.rewrite_location(headers, host);
            }
        }
    }

    fn rewrite_location(&self, headers: &mut HeaderMap, client_host: &HeaderValue) {
        let Some(location) = headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| Uri::from_str(v).ok())
        else {
            return;
        };

        let same_upstream = location
            .authority()
            .is_some_and(|a| a.as_str().eq_ignore_ascii_case(self.target_authority.as_str()));
        if !same_upstream {
            return;
        }

        let Some(authority) = client_host
            .to_str()
            .ok()
            .and_then(|h| Authority::from_str(h).ok())
        else {
            return;
        };

        let mut parts = location.into_parts();
        parts.authority = Some(authority);
        if let Some(scheme) = &self.redirect_scheme {
            parts.scheme = Some(scheme.clone());
        }

        if let Some(rewritten) = Uri::from_parts(parts)
            .ok()
            .and_then(|uri| HeaderValue::from_str(&uri.to_string()).ok())
        {
            headers.insert(header::LOCATION, rewritten);
        }
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(status.as_u16(), 201 | 301 | 302 | 307 | 308)
}
