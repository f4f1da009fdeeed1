// =============================================================================
// EMA Trend Analyzer — Main Entry Point
// =============================================================================
//
// Serves a single dashboard page plus a small JSON/SVG API. Each request
// fetches a year of daily bars, computes EMA20/50/100/200, classifies the
// trend, and renders the result. Nothing survives the request.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod error;
mod indicators;
mod market_data;
mod pipeline;
mod presentation;
mod runtime_config;
mod trend;
mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::market_data::YahooClient;
use crate::runtime_config::AnalyzerConfig;

const CONFIG_PATH: &str = "analyzer_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("EMA Trend Analyzer starting up");

    let mut config = AnalyzerConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AnalyzerConfig::default()
    });
    config.apply_env_overrides();

    info!(
        bind_addr = %config.bind_addr,
        provider = %config.yahoo_base_url,
        default_ticker = %config.default_ticker,
        "Configuration resolved"
    );

    // ── 2. Price provider ────────────────────────────────────────────────
    let provider = YahooClient::new(
        config.yahoo_base_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )
    .context("failed to build Yahoo Finance client")?;

    // ── 3. Shared (read-only) state ──────────────────────────────────────
    let state = Arc::new(AppState::new(&config, Arc::new(provider)));

    // ── 4. API server ────────────────────────────────────────────────────
    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "Dashboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")?;

    info!("EMA Trend Analyzer shut down complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    warn!("Shutdown signal received — stopping gracefully");
}
