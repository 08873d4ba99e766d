//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events, text or JSON)
//!     → metrics.rs (counters, gauges, histograms)
//!     → http/request.rs (per-request span with request id)
//!
//! Consumers:
//!     → stdout
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID lives in the span only, never in forwarded headers
//! - Metrics are off by default; recording without an exporter is free

pub mod logging;
pub mod metrics;
