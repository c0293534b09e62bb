// =============================================================================
// Stock Lens — Main Entry Point
// =============================================================================
//
// Loads configuration, builds the Yahoo price source and the forecaster, then
// serves the dashboard API until Ctrl+C.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis;
mod api;
mod app_state;
mod forecast;
mod indicators;
mod market_data;
mod presentation;
mod runtime_config;
mod strategy;
mod types;
mod yahoo;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::RuntimeConfig;
use crate::yahoo::YahooClient;

const DEFAULT_CONFIG_PATH: &str = "stock_lens.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & logging ─────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Stock Lens starting up");

    // ── 2. Configuration ─────────────────────────────────────────────────
    let config_path =
        std::env::var("STOCK_LENS_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());

    let mut config = match RuntimeConfig::load(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, path = %config_path, "failed to load config, using defaults");
            let cfg = RuntimeConfig::default();
            if let Err(e) = cfg.save(&config_path) {
                warn!(error = %e, "failed to write default config");
            }
            cfg
        }
    };
    config.apply_env_overrides();

    info!(
        default_symbol = %config.default_symbol,
        default_strategy = %config.strategy.default_strategy,
        horizon = config.forecast.horizon,
        "configuration ready"
    );

    // ── 3. Collaborators ─────────────────────────────────────────────────
    let source = YahooClient::new(config.yahoo_base_url.clone(), config.request_timeout_secs)
        .context("failed to build Yahoo Finance client")?;
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, Arc::new(source)));

    // ── 4. HTTP API ──────────────────────────────────────────────────────
    let app = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening. Press Ctrl+C to stop.");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!(
        requests_served = state.requests_served(),
        "Stock Lens shut down complete"
    );
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    warn!("shutdown signal received, stopping gracefully");
}
