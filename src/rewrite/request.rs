//! Outbound header rewriting.

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

use crate::config::UpstreamConfig;
use crate::error::StartupError;
use crate::rewrite::hop_by_hop::strip_hop_by_hop;
use crate::upstream::UpstreamTarget;

const FORWARDING_HEADERS: [HeaderName; 3] = [
    HeaderName::from_static("x-forwarded-for"),
    HeaderName::from_static("x-forwarded-proto"),
    HeaderName::from_static("x-forwarded-host"),
];

/// Makes a forwarded request look like it came straight from a browser on
/// the spoofed origin.
#[derive(Debug, Clone)]
pub struct RequestRewriter {
    origin: HeaderValue,
    referer: HeaderValue,
    user_agent: HeaderValue,
    host: HeaderValue,
}

impl RequestRewriter {
    pub fn new(upstream: &UpstreamConfig, target: &UpstreamTarget) -> Result<Self, StartupError> {
        let value = |field: &'static str, raw: &str| {
            HeaderValue::from_str(raw).map_err(|_| StartupError::Header(field))
        };

        Ok(Self {
            origin: value("upstream.origin", &upstream.origin)?,
            referer: value("upstream.origin", &format!("{}/", upstream.origin))?,
            user_agent: value("upstream.user_agent", &upstream.user_agent)?,
            host: target.host_header().clone(),
        })
    }

    /// Rewrite inbound headers into outbound headers.
    ///
    /// Only the spoofed identity, `Host`, forwarding and hop-by-hop headers
    /// change. `Cookie` always survives, folded into a single field.
    pub fn rewrite(&self, headers: &mut HeaderMap) {
        let cookie = fold_cookies(headers);

        strip_hop_by_hop(headers);
        for name in &FORWARDING_HEADERS {
            headers.remove(name);
        }

        headers.insert(header::ORIGIN, self.origin.clone());
        headers.insert(header::REFERER, self.referer.clone());
        headers.insert(header::USER_AGENT, self.user_agent.clone());
        headers.insert(header::HOST, self.host.clone());

        headers.remove(header::COOKIE);
        if let Some(cookie) = cookie {
            headers.insert(header::COOKIE, cookie);
        }
    }
}

/// Join all `Cookie` fields with `; ` (HTTP/2 clients send one per pair).
fn fold_cookies(headers: &HeaderMap) -> Option<HeaderValue> {
    let mut values = headers.get_all(header::COOKIE).iter();
    let first = values.next()?;
    let rest: Vec<&HeaderValue> = values.collect();
    if rest.is_empty() {
        return Some(first.clone());
    }

    let mut joined = first.as_bytes().to_vec();
    for value in rest {
        joined.extend_from_slice(b"; ");
        joined.extend_from_slice(value.as_bytes());
    }
    HeaderValue::from_bytes(&joined).ok().or_else(|| Some(first.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewriter() -> RequestRewriter {
        let config = UpstreamConfig::default();
        let target = UpstreamTarget::parse(&config.target).unwrap();
        RequestRewriter::new(&config, &target).unwrap()
    }

    fn get<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
        headers.get(name).map(|v| v.to_str().unwrap())
    }

    #[test]
    fn spoofs_identity_regardless_of_inbound_values() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ORIGIN, HeaderValue::from_static("http://localhost:5173"));
        headers.insert(header::REFERER, HeaderValue::from_static("http://localhost:5173/login"));
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.0"));
        headers.insert(header::HOST, HeaderValue::from_static("localhost:3015"));

        rewriter().rewrite(&mut headers);

        assert_eq!(get(&headers, "origin"), Some("https://crocobet.com"));
        assert_eq!(get(&headers, "referer"), Some("https://crocobet.com/"));
        assert_eq!(
            get(&headers, "user-agent"),
            Some(crate::config::schema::DEFAULT_USER_AGENT)
        );
        assert_eq!(get(&headers, "host"), Some("qa-back-cms.crocobet.com"));
    }

    #[test]
    fn sets_identity_when_absent() {
        let mut headers = HeaderMap::new();
        rewriter().rewrite(&mut headers);
        assert_eq!(get(&headers, "origin"), Some("https://crocobet.com"));
        assert_eq!(get(&headers, "referer"), Some("https://crocobet.com/"));
        assert!(headers.get(header::COOKIE).is_none());
    }

    #[test]
    fn removes_forwarding_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("http"));
        headers.insert("x-forwarded-host", HeaderValue::from_static("localhost"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer t"));

        rewriter().rewrite(&mut headers);

        assert!(headers.get("x-forwarded-for").is_none());
        assert!(headers.get("x-forwarded-proto").is_none());
        assert!(headers.get("x-forwarded-host").is_none());
        assert_eq!(get(&headers, "authorization"), Some("Bearer t"));
    }

    #[test]
    fn cookie_survives_even_when_listed_in_connection() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, cookie"));
        headers.insert(header::COOKIE, HeaderValue::from_static("session=abc; theme=dark"));

        rewriter().rewrite(&mut headers);

        assert!(headers.get(header::CONNECTION).is_none());
        assert_eq!(get(&headers, "cookie"), Some("session=abc; theme=dark"));
    }

    #[test]
    fn folds_multiple_cookie_fields() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("b=2"));

        rewriter().rewrite(&mut headers);

        assert_eq!(headers.get_all(header::COOKIE).iter().count(), 1);
        assert_eq!(get(&headers, "cookie"), Some("a=1; b=2"));
    }
}
