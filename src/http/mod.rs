//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, TraceLayer span from request.rs)
//!     → rewrite::cors (preflight short-circuit)
//!     → server.rs proxy_handler
//!         ├─ upgrade?  → websocket.rs (raw tunnel)
//!         └─ otherwise → rewrite → upstream → rewrite
//!     → response.rs (502 JSON on failure, streaming body otherwise)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod websocket;

pub use request::RequestId;
pub use response::ErrorBody;
pub use server::{AppState, HttpServer};
