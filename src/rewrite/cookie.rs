//! `Set-Cookie` attribute stripping.
//!
//! Cookies issued for the upstream's domain carry `Secure`, `SameSite` and
//! `Domain` attributes that stop a browser from storing them for the relay's
//! host. Those three are dropped; everything else keeps its original text.

use axum::http::header::{self, Entry, HeaderMap, HeaderValue};

const STRIPPED_ATTRIBUTES: [&str; 3] = ["secure", "samesite", "domain"];

/// Remove `Secure`, `SameSite` and `Domain` from one `Set-Cookie` value.
///
/// The leading `name=value` pair is never inspected. Attribute names are
/// matched case-insensitively with surrounding whitespace ignored.
pub fn strip_cookie_attributes(cookie: &str) -> String {
    let mut segments = cookie.split(';');
    let mut out = String::with_capacity(cookie.len());
    if let Some(pair) = segments.next() {
        out.push_str(pair);
    }

    for attribute in segments {
        let name = attribute.split('=').next().unwrap_or_default().trim();
        if STRIPPED_ATTRIBUTES
            .iter()
            .any(|stripped| name.eq_ignore_ascii_case(stripped))
        {
            continue;
        }
        out.push(';');
        out.push_str(attribute);
    }

    out
}

/// Rewrite every `Set-Cookie` field in place, keeping their order.
pub fn rewrite_set_cookies(headers: &mut HeaderMap) {
    let Entry::Occupied(mut cookies) = headers.entry(header::SET_COOKIE) else {
        return;
    };
    for value in cookies.iter_mut() {
        let Ok(text) = value.to_str() else {
            continue;
        };
        let stripped = strip_cookie_attributes(text);
        if stripped.len() != text.len() {
            if let Ok(rewritten) = HeaderValue::from_str(&stripped) {
                *value = rewritten;
            }
        }
    }
}
