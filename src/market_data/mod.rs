// =============================================================================
// Market Data Module
// =============================================================================
//
// The analyzer needs one thing from the outside world: a year of adjusted
// daily bars for a ticker. `PriceProvider` is that seam. A provider returns an
// empty `PriceSeries` when the ticker has no data and a `ProviderError` for
// anything that went wrong on the way there, so the caller can tell
// "unknown ticker" apart from "the network is down".
// =============================================================================

pub mod yahoo;

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use thiserror::Error;

use crate::types::{PriceSeries, Ticker};

pub use yahoo::YahooClient;

/// Calendar days in the trailing fetch window.
pub const LOOKBACK_DAYS: u64 = 365;

/// Inclusive calendar-date range to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchWindow {
    /// The [`LOOKBACK_DAYS`] window ending on `today`.
    pub fn trailing_year(today: NaiveDate) -> Self {
        let start = today.checked_sub_days(Days::new(LOOKBACK_DAYS)).unwrap_or(NaiveDate::MIN);
        Self { start, end: today }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("provider error {code}: {description}")]
    Api { code: String, description: String },

    #[error("failed to decode provider response: {0}")]
    Decode(String),

    #[error("invalid provider URL: {0}")]
    InvalidUrl(String),
}

impl From<serde_json::Error> for ProviderError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}

#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Fetch adjusted daily bars for `ticker` within `window`.
    ///
    /// An empty series means the provider has no data for the ticker.
    async fn fetch_daily(
        &self,
        ticker: &Ticker,
        window: FetchWindow,
    ) -> Result<PriceSeries, ProviderError>;
}
