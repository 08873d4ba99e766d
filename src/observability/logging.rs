//! Structured logging.
//!
//! `RUST_LOG` wins over the configured level. Text output is for terminals,
//! JSON for log shippers.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(&config.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init(),
    }
}

/// A bare level applies to this crate and tower-http; anything else is
/// taken as a full filter directive.
fn default_filter(level: &str) -> String {
    if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("cors_relay={level},tower_http={level}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_targets_relay_and_tower_http() {
        assert_eq!(default_filter("debug"), "cors_relay=debug,tower_http=debug");
    }

    #[test]
    fn directives_pass_through() {
        assert_eq!(default_filter("cors_relay=trace,hyper=info"), "cors_relay=trace,hyper=info");
    }
}
