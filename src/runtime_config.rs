// =============================================================================
// Runtime Configuration — service settings loaded at startup
// =============================================================================
//
// Settings for the HTTP service and the price provider. EMA periods and the
// look-back window are fixed and deliberately absent.
//
// All fields carry `#[serde(default)]` so a partial (or empty) JSON file is
// valid. Environment variables override the file.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::market_data::yahoo::DEFAULT_BASE_URL;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_yahoo_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_ticker() -> String {
    "APOLLOMICRO.NS".to_string()
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

fn default_price_axis_label() -> String {
    "Price (INR)".to_string()
}

// =============================================================================
// AnalyzerConfig
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Address the HTTP server listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Base URL of the Yahoo Finance chart API.
    #[serde(default = "default_yahoo_base_url")]
    pub yahoo_base_url: String,

    /// Per-request HTTP timeout for the price provider.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Ticker pre-filled on the dashboard when no query is given.
    #[serde(default = "default_ticker")]
    pub default_ticker: String,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    #[serde(default = "default_price_axis_label")]
    pub price_axis_label: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            yahoo_base_url: default_yahoo_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            default_ticker: default_ticker(),
            currency_symbol: default_currency_symbol(),
            price_axis_label: default_price_axis_label(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read analyzer config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse analyzer config from {}", path.display()))?;

        info!(
            path = %path.display(),
            bind_addr = %config.bind_addr,
            default_ticker = %config.default_ticker,
            "analyzer config loaded"
        );

        Ok(config)
    }

    /// Apply `EMA_*` environment overrides using `lookup` to read variables.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_blank = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(addr) = non_blank("EMA_BIND_ADDR") {
            self.bind_addr = addr;
        }
        if let Some(url) = non_blank("EMA_YAHOO_BASE_URL") {
            self.yahoo_base_url = url;
        }
        if let Some(ticker) = non_blank("EMA_DEFAULT_TICKER") {
            self.default_ticker = ticker.to_uppercase();
        }
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }
}
