// =============================================================================
// Application State — what every request handler can see
// =============================================================================
//
// Read-only after startup. Requests share the provider (a stateless HTTP
// client) and the display settings; no analysis result is ever stored here.
// =============================================================================

use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::market_data::PriceProvider;
use crate::presentation::DisplaySettings;
use crate::runtime_config::AnalyzerConfig;

pub struct AppState {
    pub provider: Arc<dyn PriceProvider>,
    pub display: DisplaySettings,
    pub default_ticker: String,
    /// Source of "today" for the trailing fetch window.
    pub clock: fn() -> NaiveDate,
}

impl AppState {
    pub fn new(config: &AnalyzerConfig, provider: Arc<dyn PriceProvider>) -> Self {
        Self {
            provider,
            display: DisplaySettings::from_config(config),
            default_ticker: config.default_ticker.clone(),
            clock: local_today,
        }
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}
