//! Header rewriting pipeline.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (OPTIONS answered here, never forwarded)
//!     → request.rs (spoof Origin/Referer/User-Agent, set Host,
//!                   drop X-Forwarded-* and hop-by-hop, keep Cookie)
//!     → upstream
//!     → response.rs (strip Set-Cookie attributes, drop security
//!                    headers, point redirects back at the relay)
//!     → cors.rs (Access-Control-* on the way out)
//! ```
//!
//! # Design Decisions
//! - Every stage is a pure header transform and cannot fail
//! - Stages are built once from the config and shared read-only
//! - Upgrade requests skip the whole pipeline

pub mod cookie;
pub mod cors;
pub mod hop_by_hop;
pub mod request;
pub mod response;

pub use cors::{cors_middleware, CorsHeaders};
pub use request::RequestRewriter;
pub use response::ResponseRewriter;
