//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! rewritten request
//!     → target.rs (absolute URI: target scheme + authority + prefix + path)
//!     → client.rs (pooled hyper client, optional timeout)
//!     → Response<Incoming> back to the handler
//! ```
//!
//! # Design Decisions
//! - Exactly one upstream, fixed at startup
//! - HTTP/1.1 only so upgrades can be tunneled
//! - Failures surface as `ProxyError`, never retried

pub mod client;
pub mod target;

pub use client::UpstreamClient;
pub use target::{TargetError, UpstreamTarget};
