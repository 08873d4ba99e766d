//! CORS-opening reverse proxy for a single upstream.
//!
//! Forwards every request to one fixed origin while spoofing the browser
//! identity the upstream checks, and loosens the responses (cookies,
//! security headers, CORS) so a page on another host can use the API.

pub mod cli;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rewrite;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use error::{ProxyError, StartupError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
