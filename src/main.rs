//! cors-relay
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────────┐
//!                 │                      CORS RELAY                      │
//!   Browser       │  ┌──────┐   ┌─────────┐   ┌──────────┐   ┌────────┐  │
//!   ──────────────┼─▶│ cors │──▶│ request │──▶│ upstream │──▶│ hyper  │──┼──▶ Upstream
//!                 │  │      │   │ rewrite │   │  target  │   │ client │  │
//!                 │  └──┬───┘   └─────────┘   └──────────┘   └───┬────┘  │
//!                 │     │ OPTIONS → 204                          │       │
//!   ◀─────────────┼─────┴───────────── response rewrite ◀────────┘       │
//!                 │                                                      │
//!   WebSocket ────┼──────────── raw tunnel (no rewriting) ───────────────┼──▶
//!                 └──────────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use tokio::net::TcpListener;

use cors_relay::cli::Cli;
use cors_relay::config::load_config;
use cors_relay::http::HttpServer;
use cors_relay::lifecycle::{signals, Shutdown};
use cors_relay::observability::{logging, metrics};
use cors_relay::StartupError;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref(), &cli.overrides())?;

    logging::init_logging(&config.observability);
    tracing::info!("cors-relay v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        // Validation guarantees the address parses.
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr).map_err(StartupError::from)?;
        }
    }

    let listener = TcpListener::bind(config.listener.bind_address())
        .await
        .map_err(StartupError::from)?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        local = %format!("http://localhost:{}", local_addr.port()),
        bind = %local_addr,
        target = %config.upstream.target,
        origin = %config.upstream.origin,
        "Ready to proxy requests"
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::forward_signals(shutdown));

    let server = HttpServer::new(&config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
