//! Configuration validation.
//!
//! Serde handles the syntax; this module checks the values. Validation is a
//! pure function over `ProxyConfig` and reports every problem it finds, not
//! just the first.

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;
use crate::upstream::{TargetError, UpstreamTarget};

/// A single semantic problem in the configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("upstream.target: {0}")]
    Target(#[from] TargetError),

    #[error("upstream.origin {0:?} must be a bare http(s) origin such as https://example.com")]
    Origin(String),

    #[error("upstream.user_agent is not a valid header value")]
    UserAgent,

    #[error("upstream.redirect_scheme {0:?} must be \"http\" or \"https\"")]
    RedirectScheme(String),

    #[error("listener.host must not be empty")]
    EmptyHost,

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::EmptyHost);
    }

    if let Err(e) = UpstreamTarget::parse(&config.upstream.target) {
        errors.push(e.into());
    }

    if !is_bare_origin(&config.upstream.origin) {
        errors.push(ValidationError::Origin(config.upstream.origin.clone()));
    }

    if HeaderValue::from_str(&config.upstream.user_agent).is_err() {
        errors.push(ValidationError::UserAgent);
    }

    if let Some(scheme) = &config.upstream.redirect_scheme {
        if scheme != "http" && scheme != "https" {
            errors.push(ValidationError::RedirectScheme(scheme.clone()));
        }
    }

    if config.timeouts.connect_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout("timeouts.connect_secs"));
    }
    if config.timeouts.request_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// An origin is scheme + host + optional port, serialized canonically.
fn is_bare_origin(origin: &str) -> bool {
    match Url::parse(origin) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.origin().ascii_serialization() == origin
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn reports_all_errors_at_once() {
        let mut config = ProxyConfig::default();
        config.upstream.target = "ftp://files.example.com".into();
        config.upstream.origin = "https://crocobet.com/".into();
        config.upstream.user_agent = "bad\nagent".into();
        config.timeouts.request_secs = Some(0);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(matches!(errors[0], ValidationError::Target(_)));
        assert_eq!(errors[1], ValidationError::Origin("https://crocobet.com/".into()));
        assert_eq!(errors[2], ValidationError::UserAgent);
        assert_eq!(errors[3], ValidationError::ZeroTimeout("timeouts.request_secs"));
    }

    #[test]
    fn origin_must_be_bare() {
        assert!(is_bare_origin("https://crocobet.com"));
        assert!(is_bare_origin("http://localhost:3000"));
        assert!(!is_bare_origin("https://crocobet.com/app"));
        assert!(!is_bare_origin("crocobet.com"));
        assert!(!is_bare_origin("ws://crocobet.com"));
    }

    #[test]
    fn redirect_scheme_is_checked() {
        let mut config = ProxyConfig::default();
        config.upstream.redirect_scheme = Some("gopher".into());
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::RedirectScheme("gopher".into())])
        );

        config.upstream.redirect_scheme = Some("http".into());
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert_eq!(validate_config(&config), Ok(()));

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::MetricsAddress("nowhere".into())])
        );
    }
}
