//! # Market Data Gateway
//!
//! An `axum` HTTP server exposing the market-data fetchers of `lib_marketdata`.
//! It binds `0.0.0.0:8000` unless `--host`/`--port` (or `MARKET_HOST`,
//! `MARKET_PORT`) say otherwise, and runs until SIGINT or SIGTERM. Upstream
//! fetches are limited to `MARKET_ALLOWED_HOSTS` (the provider API hosts by
//! default).

use anyhow::Result;
use lib_marketdata::loggers::init_logging;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};

mod market_logic;
use market_logic::{config::Config, routes::{self, GatewayState}};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load();
    let _log_guard = init_logging(&config.logging_options())?;

    let addr = config.socket_addr();
    let state = GatewayState::from_config(&config);
    info!("Starting HTTP server on http://{}", addr);
    info!("Allowed upstream hosts: {}", state.allowed_hosts.join(", "));

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, routes::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    tokio::select! {
        result = signal::ctrl_c() => {
            match result {
                Ok(()) => info!("Ctrl-C received, initiating shutdown."),
                Err(e) => {
                    error!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        }
        _ = terminate() => {
            info!("SIGTERM received, initiating shutdown.");
        }
    }
}

#[cfg(unix)]
async fn terminate() {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(mut term_signal) => {
            term_signal.recv().await;
        }
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    // On non-unix platforms, just wait forever.
    std::future::pending::<()>().await;
}
